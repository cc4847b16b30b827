//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, form decoding,
//! method override, route matching and access logging.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::{Method, Request, Response};

use super::form::{self, FormData};
use super::tasks;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A matched route with its path parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Home,
    NewTask,
    EditTask(&'a str),
    CreateTask,
    ShowTask(&'a str),
    UpdateTask(&'a str),
    DeleteTask(&'a str),
    NotFound,
}

impl<'a> Route<'a> {
    /// Match an (effective) method and path. A trailing slash is ignored and
    /// `HEAD` is routed like `GET`.
    pub fn resolve(method: &Method, path: &'a str) -> Self {
        let method = if method == Method::HEAD {
            &Method::GET
        } else {
            method
        };
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        let segments: Vec<&'a str> = path.split('/').skip(1).collect();

        match (method, segments.as_slice()) {
            (&Method::GET, [""]) => Self::Home,
            (&Method::GET, ["tasks", "new"]) => Self::NewTask,
            (&Method::GET, ["tasks", id, "edit"]) if !id.is_empty() => Self::EditTask(*id),
            (&Method::POST, ["tasks"]) => Self::CreateTask,
            (&Method::GET, ["tasks", id]) if !id.is_empty() => Self::ShowTask(*id),
            (&Method::PATCH, ["tasks", id]) if !id.is_empty() => Self::UpdateTask(*id),
            (&Method::DELETE, ["tasks", id]) if !id.is_empty() => Self::DeleteTask(*id),
            _ => Self::NotFound,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = state.access_log_enabled().then(|| {
        AccessLogEntry::from_request(
            peer_addr.to_string(),
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let mut response = dispatch(req, &state, entry.as_mut()).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(
    req: Request<B>,
    state: &AppState,
    entry: Option<&mut AccessLogEntry>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(req.headers(), max_body_size) {
        return resp;
    }

    let (parts, body) = req.into_parts();
    let query = FormData::from_query(parts.uri.query());
    let form = if carries_form(&parts.method, &parts.headers) {
        match read_form(body, max_body_size).await {
            Ok(form) => form,
            Err(resp) => return resp,
        }
    } else {
        FormData::default()
    };

    let method = match form::method_override(&parts.method, &form, &query) {
        Some(effective) => {
            logger::log_method_override(parts.method.as_str(), effective.as_str());
            if let Some(entry) = entry {
                entry.effective_method = Some(effective.to_string());
            }
            effective
        }
        None => parts.method.clone(),
    };

    match Route::resolve(&method, parts.uri.path()) {
        Route::Home => tasks::home(state).await,
        Route::NewTask => tasks::new_form(state),
        Route::EditTask(id) => tasks::edit_form(state, id).await,
        Route::CreateTask => tasks::create(state, &form).await,
        Route::ShowTask(id) => tasks::show(state, id).await,
        Route::UpdateTask(id) => tasks::update(state, id, &form).await,
        Route::DeleteTask(id) => tasks::delete(state, id).await,
        Route::NotFound => {
            logger::log_debug(&format!("[Route] No route for {method} {}", parts.uri.path()));
            tasks::not_found(state, "Page not found")
        }
    }
}

/// Only bodies of non-GET requests declared (or defaulting to) form encoding are decoded
fn carries_form(method: &Method, headers: &HeaderMap) -> bool {
    if method == Method::GET || method == Method::HEAD {
        return false;
    }
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(true, |ct| ct.starts_with(FORM_CONTENT_TYPE))
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Read the whole body, enforcing the size limit for chunked uploads too
async fn read_form<B>(body: B, max_body_size: u64) -> Result<FormData, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(FormData::parse(&collected.to_bytes())),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!("Request body exceeds {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{
        body_text, get, post_form, state_with, task, FakeTasks, ListReply,
    };
    use hyper::header::LOCATION;
    use hyper::StatusCode;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        req: Request<Full<Bytes>>,
    ) -> Response<Full<Bytes>> {
        handle_request(req, peer(), Arc::clone(state)).await.unwrap()
    }

    #[test]
    fn test_resolve_routes() {
        assert_eq!(Route::resolve(&Method::GET, "/"), Route::Home);
        assert_eq!(Route::resolve(&Method::GET, "/tasks/new"), Route::NewTask);
        assert_eq!(Route::resolve(&Method::GET, "/tasks/4/edit"), Route::EditTask("4"));
        assert_eq!(Route::resolve(&Method::POST, "/tasks"), Route::CreateTask);
        assert_eq!(Route::resolve(&Method::GET, "/tasks/4"), Route::ShowTask("4"));
        assert_eq!(Route::resolve(&Method::PATCH, "/tasks/4"), Route::UpdateTask("4"));
        assert_eq!(Route::resolve(&Method::DELETE, "/tasks/4"), Route::DeleteTask("4"));
    }

    #[test]
    fn test_resolve_edge_cases() {
        assert_eq!(Route::resolve(&Method::GET, "/tasks/4/"), Route::ShowTask("4"));
        assert_eq!(Route::resolve(&Method::HEAD, "/"), Route::Home);
        assert_eq!(Route::resolve(&Method::GET, "/tasks"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::POST, "/tasks/4"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::GET, "/tasks//edit"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::PUT, "/tasks/4"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::GET, "/favicon.ico"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_home_lists_sorted_rows() {
        let fake = Arc::new(FakeTasks::new(ListReply::Tasks(vec![
            task(2, "Second", "COMPLETED"),
            task(1, "First", "TODO"),
        ])));
        let state = state_with(Arc::clone(&fake));

        let resp = send(&state, get("/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(first < second);
        assert!(html.contains("To Do"));
        assert!(html.contains("Completed"));
    }

    #[tokio::test]
    async fn test_home_invalid_payload_renders_error() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::NotArray)));

        let html = body_text(send(&state, get("/")).await).await;
        assert!(html.contains("Tasks data is invalid"));
        assert!(!html.contains("<td"));
    }

    #[tokio::test]
    async fn test_home_remote_failure_renders_error() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Fail)));

        let resp = send(&state, get("/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Failed to load tasks"));
    }

    #[tokio::test]
    async fn test_home_empty_collection_placeholder() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));

        let html = body_text(send(&state, get("/")).await).await;
        assert!(html.contains("No tasks available"));
        assert_eq!(html.matches("<tr>").count(), 2); // header row + placeholder
    }

    #[tokio::test]
    async fn test_new_form_is_blank() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));

        let resp = send(&state, get("/tasks/new")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Create task"));
    }

    #[tokio::test]
    async fn test_create_redirects_home() {
        let fake = Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new())));
        let state = state_with(Arc::clone(&fake));

        let resp = send(
            &state,
            post_form(
                "/tasks",
                "title=Tax+return&description=File+it&dueDate-day=1&dueDate-month=7&dueDate-year=2025",
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[LOCATION], "/");

        let created = fake.created.lock().unwrap();
        assert_eq!(created[0].title.as_deref(), Some("Tax return"));
        assert_eq!(created[0].status, "TODO");
        assert_eq!(created[0].due_date.as_deref(), Some("2025-07-01"));
    }

    #[tokio::test]
    async fn test_create_failure_redisplays_form() {
        let state = state_with(Arc::new(FakeTasks::failing()));

        let resp = send(&state, post_form("/tasks", "title=Tax+return&status=IN_PROGRESS")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Failed to create task"));
        assert!(html.contains(r#"value="Tax return""#));
        assert!(html.contains(r#"<option value="IN_PROGRESS" selected>"#));
    }

    #[tokio::test]
    async fn test_method_override_dispatches_delete() {
        let fake = Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new())));
        let state = state_with(Arc::clone(&fake));

        let resp = send(&state, post_form("/tasks/3", "_method=DELETE")).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(fake.calls(), vec!["delete 3".to_string()]);
        assert!(fake.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_override_dispatches_delete() {
        let fake = Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new())));
        let state = state_with(Arc::clone(&fake));

        let resp = send(&state, post_form("/tasks/3?_method=DELETE", "")).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(fake.calls(), vec!["delete 3".to_string()]);
    }

    #[tokio::test]
    async fn test_get_with_override_is_not_delete() {
        let fake = Arc::new(FakeTasks::with_task(task(3, "Keep me", "TODO")));
        let state = state_with(Arc::clone(&fake));

        let resp = send(&state, get("/tasks/3?_method=DELETE")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fake.calls(), vec!["get 3".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_failure_renders_home_error() {
        let state = state_with(Arc::new(FakeTasks::failing()));

        let resp = send(&state, post_form("/tasks/3", "_method=DELETE")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Failed to delete task"));
        assert!(!html.contains("<td"));
    }

    #[tokio::test]
    async fn test_update_sends_only_status() {
        let fake = Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new())));
        let state = state_with(Arc::clone(&fake));

        let resp = send(
            &state,
            post_form("/tasks/8", "_method=PATCH&title=Ignored&status=COMPLETED"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(fake.calls(), vec!["update 8".to_string()]);
        assert_eq!(
            fake.patched.lock().unwrap()[0].status.as_deref(),
            Some("COMPLETED")
        );
    }

    #[tokio::test]
    async fn test_update_failure_redisplays_form() {
        let state = state_with(Arc::new(FakeTasks::failing()));

        let resp = send(&state, post_form("/tasks/8", "_method=PATCH&status=COMPLETED")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Failed to update task"));
        assert!(html.contains(r#"action="/tasks/8""#));
    }

    #[tokio::test]
    async fn test_edit_prefills_form() {
        let mut source = task(5, "Renew passport", "IN_PROGRESS");
        source.due_date = Some("2026-01-20".to_string());
        let state = state_with(Arc::new(FakeTasks::with_task(source)));

        let resp = send(&state, get("/tasks/5/edit")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Update task 5"));
        assert!(html.contains(r#"<option value="IN_PROGRESS" selected>"#));
    }

    #[tokio::test]
    async fn test_edit_absent_task_is_404() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));

        let resp = send(&state, get("/tasks/5/edit")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Task not found"));
    }

    #[tokio::test]
    async fn test_show_renders_details_or_not_found() {
        let state = state_with(Arc::new(FakeTasks::with_task(task(6, "Walk dog", "COMPLETED"))));
        let html = body_text(send(&state, get("/tasks/6")).await).await;
        assert!(html.contains("Walk dog"));
        assert!(html.contains("Completed"));

        let state = state_with(Arc::new(FakeTasks::failing()));
        let resp = send(&state, get("/tasks/6")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Task not found"));

        // An absent task is not-found too, still without a 404
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));
        let resp = send(&state, get("/tasks/6")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Task not found"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_page() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));

        let resp = send(&state, get("/nowhere")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));
        let body = "x".repeat(2 * 1_048_576);

        let resp = send(&state, post_form("/tasks", &body)).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_server_header_is_set() {
        let state = state_with(Arc::new(FakeTasks::new(ListReply::Tasks(Vec::new()))));

        let resp = send(&state, get("/")).await;
        assert_eq!(resp.headers()[SERVER], "tasks-frontend");
    }
}
