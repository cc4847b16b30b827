//! Remote task service client
//!
//! [`TaskApi`] is the seam between route handlers and the task service.
//! [`HttpTaskClient`] talks to the real service; tests substitute an
//! in-memory implementation.

mod http;

pub use http::HttpTaskClient;

use crate::error::Result;
use crate::model::{NewTask, Task, TaskPatch};

/// Operations the front end needs from the task service.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync + 'static {
    /// `GET /tasks`. Fails with `NotACollection` when the payload is not an array.
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    /// `GET /tasks/:id`. `Ok(None)` when the service answers with an empty body.
    async fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// `POST /tasks`
    async fn create_task(&self, task: &NewTask) -> Result<()>;

    /// `PATCH /tasks/:id`
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()>;

    /// `DELETE /tasks/:id`
    async fn delete_task(&self, id: &str) -> Result<()>;
}
