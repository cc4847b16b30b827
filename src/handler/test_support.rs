//! In-memory task service for handler tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response};

use crate::client::TaskApi;
use crate::config::{AppState, Config};
use crate::error::{Error, Result};
use crate::model::{NewTask, Task, TaskPatch};
use crate::views::ViewEngine;

/// What `list_tasks` answers
pub enum ListReply {
    Tasks(Vec<Task>),
    NotArray,
    Fail,
}

/// Scripted task service recording every call it receives
pub struct FakeTasks {
    pub list: ListReply,
    pub task: Option<Task>,
    pub fail: bool,
    /// Pause before answering `list_tasks`
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<NewTask>>,
    pub patched: Mutex<Vec<TaskPatch>>,
}

impl FakeTasks {
    pub fn new(list: ListReply) -> Self {
        Self {
            list,
            task: None,
            fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            patched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(ListReply::Fail)
        }
    }

    pub fn with_task(task: Task) -> Self {
        Self {
            task: Some(task),
            ..Self::new(ListReply::Tasks(Vec::new()))
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self) -> Result<()> {
        if self.fail {
            Err(Error::Status {
                status: 500,
                message: "Internal server error".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl TaskApi for FakeTasks {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.record("list".to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.list {
            ListReply::Tasks(tasks) => Ok(tasks.clone()),
            ListReply::NotArray => Err(Error::NotACollection("object")),
            ListReply::Fail => Err(Error::Status {
                status: 503,
                message: "unavailable".to_string(),
            }),
        }
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.record(format!("get {id}"));
        self.outcome()?;
        Ok(self.task.clone())
    }

    async fn create_task(&self, task: &NewTask) -> Result<()> {
        self.record("create".to_string());
        self.created.lock().unwrap().push(task.clone());
        self.outcome()
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        self.record(format!("update {id}"));
        self.patched.lock().unwrap().push(patch.clone());
        self.outcome()
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.record(format!("delete {id}"));
        self.outcome()
    }
}

pub fn state_with(tasks: Arc<FakeTasks>) -> Arc<AppState> {
    let mut config = Config::load_from("does-not-exist/tasks-frontend").unwrap();
    config.logging.access_log = false;
    let views = ViewEngine::new(None).unwrap();
    Arc::new(AppState::new(&config, tasks, views))
}

pub fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

pub async fn body_text(resp: Response<Full<Bytes>>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn task(id: i64, title: &str, status: &str) -> Task {
    Task {
        id: Some(id),
        title: Some(title.to_string()),
        description: Some(format!("{title} description")),
        status: Some(status.to_string()),
        due_date: None,
    }
}
