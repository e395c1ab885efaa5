use anyhow::anyhow;
use tracing::{debug, error, info, instrument, warn};

use crate::api::ApiClient;
use crate::cli::Command;
use crate::config::Config;
use crate::filter::{PriorityFilter, StatusFilter};
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::{Priority, Status, TaskForm};

/// Backend failures on mutation paths are caught here, logged, and
/// surfaced as a generic notice; they never propagate further.
#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &mut TaskStore<ApiClient>,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::List {
            search,
            status,
            priority,
        } => cmd_list(store, renderer, search, status, priority),
        Command::Stats => cmd_stats(store, renderer),
        Command::Add {
            title,
            description,
            status,
            priority,
            file,
        } => cmd_add(store, renderer, title, description, status, priority, file),
        Command::Modify {
            id,
            title,
            description,
            status,
            priority,
            file,
        } => cmd_modify(
            store,
            renderer,
            &id,
            title,
            description,
            status,
            priority,
            file,
        ),
        Command::Done { id } => cmd_done(store, &id),
        Command::Delete { id } => cmd_delete(store, &id),
        Command::Info { id } => cmd_info(store, renderer, &id),
        Command::Open { id } => cmd_open(store, &id),
        Command::Config => cmd_config(cfg),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[instrument(skip(store, renderer))]
fn cmd_list(
    store: &mut TaskStore<ApiClient>,
    renderer: &mut Renderer,
    search: String,
    status: StatusFilter,
    priority: PriorityFilter,
) -> anyhow::Result<()> {
    info!("command list");

    store.load();
    store.filter.search = search;
    store.filter.status = status;
    store.filter.priority = priority;

    let view = store.filtered();
    if view.is_empty() {
        println!("No tasks found");
        if store.tasks().is_empty() {
            println!("Create your first task to get started");
        } else {
            println!("Try adjusting your search or filter criteria");
        }
        return Ok(());
    }

    renderer.print_task_table(&view)
}

#[instrument(skip(store, renderer))]
fn cmd_stats(store: &mut TaskStore<ApiClient>, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command stats");

    store.load();
    renderer.print_stats(&store.stats())
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(store, renderer, title, description, file))]
fn cmd_add(
    store: &mut TaskStore<ApiClient>,
    renderer: &mut Renderer,
    title: String,
    description: String,
    status: Status,
    priority: Priority,
    file: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    info!("command add");

    store.load();
    store.form = TaskForm {
        title,
        description,
        status,
        priority,
        attachment: None,
    };

    if let Some(path) = file {
        if let Err(err) = store.select_attachment(&path) {
            warn!(error = %err, "attachment rejected");
            println!("Please select a PDF file only.");
            return Ok(());
        }
    }

    match store.create() {
        Ok(task) => {
            println!("Task created successfully!");
            renderer.print_task_info(&task)
        }
        Err(err) => {
            error!(error = %err, "error saving task");
            println!("Failed to save task. Please try again.");
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(store, renderer, title, description, file))]
fn cmd_modify(
    store: &mut TaskStore<ApiClient>,
    renderer: &mut Renderer,
    id: &str,
    title: String,
    description: String,
    status: Status,
    priority: Priority,
    file: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    info!("command modify");

    store.load();
    store.form = TaskForm {
        title,
        description,
        status,
        priority,
        attachment: None,
    };

    if let Some(path) = file {
        if let Err(err) = store.select_attachment(&path) {
            warn!(error = %err, "attachment rejected");
            println!("Please select a PDF file only.");
            return Ok(());
        }
    }

    match store.edit(id) {
        Ok(task) => {
            println!("Task updated successfully!");
            renderer.print_task_info(&task)
        }
        Err(err) => {
            error!(error = %err, "error saving task");
            println!("Failed to save task. Please try again.");
            Ok(())
        }
    }
}

#[instrument(skip(store))]
fn cmd_done(store: &mut TaskStore<ApiClient>, id: &str) -> anyhow::Result<()> {
    info!("command done");

    store.load();
    match store.toggle(id) {
        Ok(None) => Ok(()),
        Ok(Some(task)) => {
            println!("Task marked as {}!", task.status);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "error updating task status");
            println!("Failed to update task status. Please try again.");
            Ok(())
        }
    }
}

#[instrument(skip(store))]
fn cmd_delete(store: &mut TaskStore<ApiClient>, id: &str) -> anyhow::Result<()> {
    info!("command delete");

    store.load();
    match store.delete(id) {
        Ok(()) => {
            println!("Task deleted successfully!");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "error deleting task");
            println!("Failed to delete task. Please try again.");
            Ok(())
        }
    }
}

#[instrument(skip(store, renderer))]
fn cmd_info(
    store: &mut TaskStore<ApiClient>,
    renderer: &mut Renderer,
    id: &str,
) -> anyhow::Result<()> {
    info!("command info");

    store.load();
    let task = store
        .find(id)
        .cloned()
        .ok_or_else(|| anyhow!("no task with id {id}"))?;
    renderer.print_task_info(&task)
}

#[instrument(skip(store))]
fn cmd_open(store: &mut TaskStore<ApiClient>, id: &str) -> anyhow::Result<()> {
    info!("command open");

    store.load();
    let task = store
        .find(id)
        .ok_or_else(|| anyhow!("no task with id {id}"))?;

    match &task.file_path {
        Some(file_path) => {
            println!("{}", store.backend().attachment_url(file_path)?);
            Ok(())
        }
        None => {
            println!("Task has no attachment.");
            Ok(())
        }
    }
}

#[instrument(skip(cfg))]
fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(String, String)> = cfg
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    entries.sort();

    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}
