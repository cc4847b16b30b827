//! Task route handlers
//!
//! One function per route. Every remote failure is logged and answered
//! with a rendered page; nothing escapes as an error.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::form::{self, FormData};
use crate::config::AppState;
use crate::error::Error;
use crate::http;
use crate::logger;
use crate::model::Task;
use crate::views::{self, DetailView, FormView, HomeView, NotFoundView, TaskFormValues};

const TASK_NOT_FOUND: &str = "Task not found";

/// `GET /`
pub async fn home(state: &AppState) -> Response<Full<Bytes>> {
    let view = match state.tasks.list_tasks().await {
        Ok(tasks) => HomeView::from_tasks(tasks),
        Err(Error::NotACollection(kind)) => {
            logger::log_warning(&format!("Tasks data is not an array: got {kind}"));
            HomeView::failed("Tasks data is invalid")
        }
        Err(e) => {
            logger::log_error_chain("Error fetching tasks", &e);
            HomeView::failed("Failed to load tasks")
        }
    };
    render(state, views::HOME, &view, StatusCode::OK)
}

/// `GET /tasks/new`
pub fn new_form(state: &AppState) -> Response<Full<Bytes>> {
    render(state, views::TASK_FORM, &FormView::blank(), StatusCode::OK)
}

/// `GET /tasks/:id/edit`
pub async fn edit_form(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match fetch_task(state, id, "Error fetching task for edit").await {
        Some(task) => {
            let view = FormView::new(TaskFormValues::from_task(id, &task), None);
            render(state, views::TASK_FORM, &view, StatusCode::OK)
        }
        None => not_found(state, TASK_NOT_FOUND),
    }
}

/// `GET /tasks/:id`
pub async fn show(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match fetch_task(state, id, "Error fetching task by ID").await {
        Some(task) => render(
            state,
            views::TASK_DETAILS,
            &DetailView::from_task(id, &task),
            StatusCode::OK,
        ),
        // The details page answers a missing task with a normal 200 page
        None => render(
            state,
            views::NOT_FOUND,
            &NotFoundView::new(TASK_NOT_FOUND),
            StatusCode::OK,
        ),
    }
}

/// `POST /tasks`
pub async fn create(state: &AppState, form: &FormData) -> Response<Full<Bytes>> {
    match state.tasks.create_task(&form::new_task(form)).await {
        Ok(()) => http::build_redirect_response("/"),
        Err(e) => {
            logger::log_error_chain("Error creating task", &e);
            let view = FormView::new(form::form_values(form, None), Some("Failed to create task"));
            render(state, views::TASK_FORM, &view, StatusCode::OK)
        }
    }
}

/// `PATCH /tasks/:id`
pub async fn update(state: &AppState, id: &str, form: &FormData) -> Response<Full<Bytes>> {
    match state.tasks.update_task(id, &form::task_patch(form)).await {
        Ok(()) => http::build_redirect_response("/"),
        Err(e) => {
            logger::log_error_chain(&format!("Error updating task {id}"), &e);
            let view = FormView::new(
                form::form_values(form, Some(id)),
                Some("Failed to update task"),
            );
            render(state, views::TASK_FORM, &view, StatusCode::OK)
        }
    }
}

/// `DELETE /tasks/:id`
pub async fn delete(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.tasks.delete_task(id).await {
        Ok(()) => http::build_redirect_response("/"),
        Err(e) => {
            logger::log_error_chain(&format!("Error deleting task {id}"), &e);
            render(
                state,
                views::HOME,
                &HomeView::failed("Failed to delete task"),
                StatusCode::OK,
            )
        }
    }
}

/// Rendered 404 page
pub fn not_found(state: &AppState, message: &str) -> Response<Full<Bytes>> {
    render(
        state,
        views::NOT_FOUND,
        &NotFoundView::new(message),
        StatusCode::NOT_FOUND,
    )
}

/// Fetch one task; an absent task counts as not found
async fn fetch_task(state: &AppState, id: &str, context: &str) -> Option<Task> {
    let err = match state.tasks.get_task(id).await {
        Ok(Some(task)) => return Some(task),
        Ok(None) => Error::NotFound(id.to_string()),
        Err(e) => e,
    };
    if err.is_not_found() {
        logger::log_warning(&format!("{context}: {err}"));
    } else {
        logger::log_error_chain(context, &err);
    }
    None
}

fn render<T: Serialize>(
    state: &AppState,
    template: &str,
    ctx: &T,
    status: StatusCode,
) -> Response<Full<Bytes>> {
    match state.views.render(template, ctx) {
        Ok(html) => http::build_html_response(status, html),
        Err(e) => {
            logger::log_error_chain(&format!("Failed to render {template}"), &e);
            http::build_500_response()
        }
    }
}
