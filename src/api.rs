//! REST collaborator for the Kanban board.
//!
//! Only the three endpoints the board needs are modelled:
//!
//! | Call                     | Endpoint                                   |
//! |--------------------------|--------------------------------------------|
//! | `active_sprint`          | `GET /api/projects/{id}/active-sprint`     |
//! | `sprint_tasks`           | `GET /api/sprints/{id}/tasks`              |
//! | `update_task_status`     | `PUT /api/tasks/{id}/status {status}`      |

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use crate::board::models::{Sprint, Task, TaskStatus};
use crate::errors::ApiError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Abstraction over the task API for testability.
/// Real implementation: `HttpTaskApi`.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// The project's active sprint, or `None` when the project has none.
    async fn active_sprint(&self, project_id: i64) -> Result<Option<Sprint>, ApiError>;

    async fn sprint_tasks(&self, sprint_id: i64) -> Result<Vec<Task>, ApiError>;

    /// Returns the server's full representation of the updated task.
    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<Task, ApiError>;
}

/// `reqwest`-backed client sending `Authorization: Bearer <token>`.
pub struct HttpTaskApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            token,
        })
    }

    /// Append `path` to the base URL, keeping any path the base carries
    /// (`http://gw/backend` + `/api/x` → `http://gw/backend/api/x`).
    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut req = self
            .client
            .request(method.clone(), url.clone())
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        tracing::debug!(%method, %url, "api request");
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn active_sprint(&self, project_id: i64) -> Result<Option<Sprint>, ApiError> {
        let path = format!("/api/projects/{}/active-sprint", project_id);
        match self.request::<Sprint>(Method::GET, &path, None).await {
            Ok(sprint) => Ok(Some(sprint)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sprint_tasks(&self, sprint_id: i64) -> Result<Vec<Task>, ApiError> {
        let path = format!("/api/sprints/{}/tasks", sprint_id);
        self.request(Method::GET, &path, None).await
    }

    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{}/status", task_id);
        let body = serde_json::json!({ "status": status });
        self.request(Method::PUT, &path, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            HttpTaskApi::new("not a url", None),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpTaskApi::new("mailto:ops@example.com", None),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_url_joins_absolute_api_paths() {
        let api = HttpTaskApi::new("http://localhost:8080", None).unwrap();
        assert_eq!(
            api.url("/api/tasks/7/status").as_str(),
            "http://localhost:8080/api/tasks/7/status"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        for base in ["http://gateway.test/backend", "http://gateway.test/backend/"] {
            let api = HttpTaskApi::new(base, None).unwrap();
            assert_eq!(
                api.url("/api/tasks/7/status").as_str(),
                "http://gateway.test/backend/api/tasks/7/status"
            );
        }
    }
}
