use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    /// `completed` flips back to `pending`; everything else, `in_progress`
    /// included, flips to `completed`.
    pub fn toggled(self) -> Status {
        match self {
            Status::Completed => Status::Pending,
            _ => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => bail!("unknown status: {other} (expected pending, in_progress or completed)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => bail!("unknown priority: {other} (expected low, medium or high)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: Status,

    pub priority: Priority,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub file_path: Option<String>,

    // Redundant backend-compat flag; always equal to status == Completed.
    pub completed: bool,
}

impl Task {
    pub fn is_consistent(&self) -> bool {
        self.completed == (self.status == Status::Completed)
    }

    pub fn attachment_name(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .map(|p| p.rsplit('/').next().unwrap_or(p))
    }
}

/// Transient create/edit form state.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub attachment: Option<PathBuf>,
}

impl TaskForm {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title.trim().is_empty() {
            bail!("title must not be empty");
        }
        Ok(())
    }

    /// PDF-only; on rejection the form is left unchanged.
    pub fn attach(&mut self, path: &Path) -> anyhow::Result<()> {
        if !is_pdf(path)? {
            bail!("not a PDF file: {}", path.display());
        }
        self.attachment = Some(path.to_path_buf());
        Ok(())
    }
}

// A .pdf name whose content starts with the %PDF- magic.
fn is_pdf(path: &Path) -> anyhow::Result<bool> {
    let ext_ok = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !ext_ok {
        return Ok(false);
    }

    let mut file = fs::File::open(path)
        .with_context(|| format!("failed to open attachment {}", path.display()))?;
    let mut magic = [0u8; 5];
    let read = file.read(&mut magic)?;

    Ok(read == magic.len() && &magic == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{Status, Task, TaskForm};
    use chrono::Utc;

    fn sample_task(status: Status) -> Task {
        Task {
            id: "7".to_string(),
            title: "Buy milk".to_string(),
            description: "2%".to_string(),
            status,
            priority: super::Priority::Low,
            created_at: Utc::now(),
            file_path: None,
            completed: status == Status::Completed,
        }
    }

    #[test]
    fn toggle_is_binary() {
        assert_eq!(Status::Pending.toggled(), Status::Completed);
        assert_eq!(Status::InProgress.toggled(), Status::Completed);
        assert_eq!(Status::Completed.toggled(), Status::Pending);
    }

    #[test]
    fn completed_flag_consistency() {
        assert!(sample_task(Status::Completed).is_consistent());
        assert!(sample_task(Status::Pending).is_consistent());

        let mut broken = sample_task(Status::Pending);
        broken.completed = true;
        assert!(!broken.is_consistent());
    }

    #[test]
    fn status_round_trips_through_serde() {
        let json = serde_json::to_string(&Status::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        let back: Status = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn attach_accepts_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("invoice.pdf");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"%PDF-1.7 fake body").expect("write");

        let mut form = TaskForm::default();
        form.attach(&path).expect("pdf accepted");
        assert_eq!(form.attachment.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn attach_rejects_non_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").expect("write");

        let mut form = TaskForm::default();
        assert!(form.attach(&path).is_err());
        assert!(form.attachment.is_none());
    }

    #[test]
    fn attach_rejects_pdf_extension_with_wrong_magic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "<html>").expect("write");

        let mut form = TaskForm::default();
        assert!(form.attach(&path).is_err());
        assert!(form.attachment.is_none());
    }

    #[test]
    fn empty_title_fails_validation() {
        let form = TaskForm {
            title: "  ".to_string(),
            ..TaskForm::default()
        };
        assert!(form.validate().is_err());
    }
}
