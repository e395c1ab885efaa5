use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client, Response, multipart};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::task::{Task, TaskForm};

/// Failure kinds for a backend call; the command layer collapses all of
/// them into one generic user notice.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to backend failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend returned HTTP {status}")]
    Status { status: StatusCode },

    #[error("backend response did not match the task schema: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("failed to read attachment {path}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The backend operations the controller depends on.
pub trait Backend {
    fn fetch_all(&self) -> ApiResult<Vec<Task>>;
    fn create(&self, form: &TaskForm) -> ApiResult<Task>;
    fn update(&self, id: &str, form: &TaskForm) -> ApiResult<Task>;
    fn set_status(&self, id: &str, task: &Task) -> ApiResult<Task>;
    fn delete(&self, id: &str) -> ApiResult<()>;
}

/// Blocking REST client for the todo backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    client: Client,
}

impl ApiClient {
    pub fn new(origin: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client")?;
        Ok(Self {
            base: origin.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn origin(&self) -> &str {
        &self.base
    }

    /// Attachments are served from a `storage/` tree beside the API base
    /// path: `<origin>/../storage/<file_path>`.
    pub fn attachment_url(&self, file_path: &str) -> anyhow::Result<String> {
        let base = Url::parse(&format!("{}/", self.base))
            .with_context(|| format!("invalid api origin: {}", self.base))?;
        let joined = base
            .join(&format!("../storage/{}", file_path.trim_start_matches('/')))
            .with_context(|| format!("cannot derive storage URL for {file_path}"))?;
        Ok(joined.to_string())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn form_payload(form: &TaskForm) -> ApiResult<multipart::Form> {
        let mut payload = multipart::Form::new()
            .text("title", form.title.clone())
            .text("description", form.description.clone())
            .text("status", form.status.as_str())
            .text("priority", form.priority.as_str());

        if let Some(path) = &form.attachment {
            payload = payload
                .file("file", path)
                .map_err(|source| ApiError::Attachment {
                    path: path.display().to_string(),
                    source,
                })?;
        }

        Ok(payload)
    }
}

impl Backend for ApiClient {
    #[instrument(skip(self))]
    fn fetch_all(&self) -> ApiResult<Vec<Task>> {
        debug!(url = %self.url("/todos"), "fetching task collection");
        let response = self
            .client
            .get(self.url("/todos"))
            .send()
            .map_err(ApiError::Transport)?;
        decode(response)
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    fn create(&self, form: &TaskForm) -> ApiResult<Task> {
        let payload = Self::form_payload(form)?;
        let response = self
            .client
            .post(self.url("/todos"))
            .multipart(payload)
            .send()
            .map_err(ApiError::Transport)?;
        decode(response)
    }

    // POST with a _method=PUT override marker; the payload may carry a
    // file and stays multipart.
    #[instrument(skip(self, form))]
    fn update(&self, id: &str, form: &TaskForm) -> ApiResult<Task> {
        let payload = Self::form_payload(form)?.text("_method", "PUT");
        let response = self
            .client
            .post(self.url(&format!("/todos/{id}")))
            .multipart(payload)
            .send()
            .map_err(ApiError::Transport)?;
        decode(response)
    }

    // The toggle path never attaches a file, so this is a native JSON PUT.
    #[instrument(skip(self, task))]
    fn set_status(&self, id: &str, task: &Task) -> ApiResult<Task> {
        let body = json!({
            "title": task.title,
            "description": task.description,
            "status": task.status,
            "priority": task.priority,
            "completed": task.completed,
        });
        let response = self
            .client
            .put(self.url(&format!("/todos/{id}")))
            .json(&body)
            .send()
            .map_err(ApiError::Transport)?;
        decode(response)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/todos/{id}")))
            .send()
            .map_err(ApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, id, "delete returned non-success status");
            return Err(ApiError::Status { status });
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        warn!(%status, "backend returned non-success status");
        return Err(ApiError::Status { status });
    }
    response.json::<T>().map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ApiClient;

    #[test]
    fn attachment_url_is_sibling_of_api_base() {
        let client =
            ApiClient::new("http://127.0.0.1:8000/api", Duration::from_secs(5)).expect("client");
        assert_eq!(
            client
                .attachment_url("todos/a1/report.pdf")
                .expect("storage url"),
            "http://127.0.0.1:8000/storage/todos/a1/report.pdf"
        );
    }

    #[test]
    fn attachment_url_keeps_host_for_pathless_origin() {
        let client =
            ApiClient::new("http://127.0.0.1:8000", Duration::from_secs(5)).expect("client");
        assert_eq!(
            client
                .attachment_url("todos/a1/report.pdf")
                .expect("storage url"),
            "http://127.0.0.1:8000/storage/todos/a1/report.pdf"
        );
    }

    #[test]
    fn attachment_url_keeps_parent_of_nested_api_base() {
        let client =
            ApiClient::new("http://127.0.0.1:8000/v1/api", Duration::from_secs(5)).expect("client");
        assert_eq!(
            client.attachment_url("x.pdf").expect("storage url"),
            "http://127.0.0.1:8000/v1/storage/x.pdf"
        );
    }

    #[test]
    fn trailing_slash_on_origin_is_ignored() {
        let client =
            ApiClient::new("http://127.0.0.1:8000/api/", Duration::from_secs(5)).expect("client");
        assert_eq!(client.origin(), "http://127.0.0.1:8000/api");
        assert_eq!(
            client.attachment_url("/x.pdf").expect("storage url"),
            "http://127.0.0.1:8000/storage/x.pdf"
        );
    }
}
