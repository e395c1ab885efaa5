use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::Stats;
use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[&Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Pri".to_string(),
            "Created".to_string(),
            "Title".to_string(),
            "File".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let status = self.paint(task.status.as_str(), status_color(task.status));
            let priority = self.paint(task.priority.as_str(), priority_color(task.priority));
            let created = task
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string();

            // strike through completed titles
            let title = if task.status == Status::Completed {
                self.paint(&task.title, "9")
            } else {
                task.title.clone()
            };

            let file = task.attachment_name().unwrap_or("").to_string();

            rows.push(vec![
                self.paint(&task.id, "33"),
                status,
                priority,
                created,
                title,
                file,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &Task) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id           {}", task.id)?;
        writeln!(out, "title        {}", task.title)?;
        writeln!(out, "description  {}", task.description)?;
        writeln!(out, "status       {}", task.status)?;
        writeln!(out, "priority     {}", task.priority)?;
        writeln!(out, "completed    {}", task.completed)?;
        writeln!(
            out,
            "created      {}",
            task.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        )?;
        if let Some(name) = task.attachment_name() {
            writeln!(out, "attachment   {name}")?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, stats))]
    pub fn print_stats(&mut self, stats: &Stats) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Total tasks  {}", stats.total)?;
        writeln!(
            out,
            "Completed    {}",
            self.paint(&stats.completed.to_string(), "32")
        )?;
        writeln!(
            out,
            "In progress  {}",
            self.paint(&stats.in_progress.to_string(), "33")
        )?;
        writeln!(out, "Pending      {}", stats.pending)?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Pending => "37",
        Status::InProgress => "33",
        Status::Completed => "32",
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "34",
        Priority::Medium => "33",
        Priority::High => "31",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
