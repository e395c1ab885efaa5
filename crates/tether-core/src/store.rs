use std::path::Path;

use anyhow::Context;
use tracing::{debug, error, info, instrument, warn};

use crate::api::Backend;
use crate::filter::{FilterSpec, Stats, stats};
use crate::task::{Status, Task, TaskForm};

/// The task list controller. Every mutation is a single backend round trip
/// reconciled into local state; on failure the pre-call state is retained.
#[derive(Debug)]
pub struct TaskStore<B: Backend> {
    backend: B,
    tasks: Vec<Task>,
    pub filter: FilterSpec,
    pub form: TaskForm,
}

impl<B: Backend> TaskStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tasks: Vec::new(),
            filter: FilterSpec::default(),
            form: TaskForm::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn filtered(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn stats(&self) -> Stats {
        stats(&self.tasks)
    }

    /// A failed fetch leaves the collection empty and is logged only.
    #[instrument(skip(self))]
    pub fn load(&mut self) {
        match self.backend.fetch_all() {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded task collection");
                self.tasks = tasks;
            }
            Err(err) => {
                error!(error = %err, "failed fetching tasks");
                self.tasks.clear();
            }
        }
    }

    /// The local entry is appended only after the backend acknowledges.
    #[instrument(skip(self), fields(title = %self.form.title))]
    pub fn create(&mut self) -> anyhow::Result<Task> {
        self.form.validate()?;
        let created = self
            .backend
            .create(&self.form)
            .context("create request failed")?;

        info!(id = %created.id, "task created");
        self.tasks.push(created.clone());
        self.form = TaskForm::default();
        Ok(created)
    }

    /// Full replacement: the local entry is swapped wholesale for the
    /// backend's representation.
    #[instrument(skip(self))]
    pub fn edit(&mut self, id: &str) -> anyhow::Result<Task> {
        self.form.validate()?;
        let updated = self
            .backend
            .update(id, &self.form)
            .context("update request failed")?;

        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => warn!(id, "updated task not present in local collection"),
        }
        self.form = TaskForm::default();
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> anyhow::Result<()> {
        self.backend
            .delete(id)
            .context("delete request failed")?;

        info!(id, "task deleted");
        self.tasks.retain(|task| task.id != id);
        Ok(())
    }

    /// An unknown id is a silent no-op (`Ok(None)`).
    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: &str) -> anyhow::Result<Option<Task>> {
        let Some(current) = self.find(id) else {
            debug!(id, "toggle target not found, ignoring");
            return Ok(None);
        };

        let mut flipped = current.clone();
        flipped.status = current.status.toggled();
        flipped.completed = flipped.status == Status::Completed;

        let updated = self
            .backend
            .set_status(id, &flipped)
            .context("status update request failed")?;

        info!(id, status = %updated.status, "task status toggled");
        if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    pub fn select_attachment(&mut self, path: &Path) -> anyhow::Result<()> {
        self.form.attach(path)
    }
}
