//! hyper-based task service client

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::Value;

use super::TaskApi;
use crate::error::{Error, Result};
use crate::model::{NewTask, Task, TaskPatch};

/// Longest slice of an error body kept in `Error::Status`
const MAX_ERROR_BODY: usize = 200;

/// Task service client over plain HTTP/1.1
pub struct HttpTaskClient {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpTaskClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Issue one call, bounded by the configured timeout if any
    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Bytes> {
        let call = self.exchange(method, path, body);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout(limit.as_secs()))?,
            None => call.await,
        }
    }

    async fn send_json<T: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<Bytes> {
        let body = serde_json::to_vec(payload)?;
        self.send(method, path, Some(body)).await
    }

    async fn exchange(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Bytes> {
        let uri: Uri = format!("{}{path}", self.base_url).parse()?;
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json");

        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(json))
            }
            None => Full::new(Bytes::new()),
        };

        let response = self.client.request(builder.body(body)?).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            let message: String = String::from_utf8_lossy(&bytes)
                .trim()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes)
    }
}

fn task_path(id: &str) -> String {
    format!("/tasks/{id}")
}

/// JSON type name used in `NotACollection` errors
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_blank(bytes: &Bytes) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

#[async_trait::async_trait]
impl TaskApi for HttpTaskClient {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let bytes = self.send(Method::GET, "/tasks", None).await?;
        if is_blank(&bytes) {
            return Err(Error::NotACollection("empty body"));
        }

        let payload: Value = serde_json::from_slice(&bytes)?;
        if !payload.is_array() {
            return Err(Error::NotACollection(json_kind(&payload)));
        }
        Ok(serde_json::from_value(payload)?)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let bytes = self.send(Method::GET, &task_path(id), None).await?;
        if is_blank(&bytes) {
            return Ok(None);
        }

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Null => Ok(None),
            payload => Ok(Some(serde_json::from_value(payload)?)),
        }
    }

    async fn create_task(&self, task: &NewTask) -> Result<()> {
        self.send_json(Method::POST, "/tasks", task).await?;
        Ok(())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        self.send_json(Method::PATCH, &task_path(id), patch).await?;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.send(Method::DELETE, &task_path(id), None).await?;
        Ok(())
    }
}
