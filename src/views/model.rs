//! View models
//!
//! Per-request projections of tasks into the values templates consume.

use serde::Serialize;

use crate::model::{status_label, Task, TaskStatus};

/// One table cell: either escaped text or trusted markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: Option<String>,
    pub html: Option<String>,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            html: None,
        }
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self {
            text: None,
            html: Some(markup.into()),
        }
    }
}

pub type Row = Vec<Cell>;

/// Context of the `home` template
#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub rows: Vec<Row>,
    pub error: Option<String>,
}

impl HomeView {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            rows: build_rows(tasks),
            error: None,
        }
    }

    /// Home page with no rows and a message, used whenever the list is unavailable
    pub fn failed(message: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

/// Sort tasks by id and project each into a display row.
///
/// An empty collection yields a single placeholder row.
pub fn build_rows(mut tasks: Vec<Task>) -> Vec<Row> {
    if tasks.is_empty() {
        return vec![placeholder_row()];
    }

    tasks.sort_by_key(|task| task.id);
    tasks.iter().map(task_row).collect()
}

fn placeholder_row() -> Row {
    vec![
        Cell::text("N/A"),
        Cell::text("No tasks available"),
        Cell::text(""),
        Cell::text(""),
        Cell::text(""),
        Cell::text(""),
    ]
}

fn task_row(task: &Task) -> Row {
    vec![
        Cell::text(task.id.map_or_else(|| "N/A".to_string(), |id| id.to_string())),
        Cell::text(task.title.clone().unwrap_or_default()),
        Cell::text(task.description.clone().unwrap_or_default()),
        Cell::text(task.due_date.clone().unwrap_or_default()),
        Cell::text(status_label(task.status.as_deref())),
        Cell::html(action_markup(task.id.unwrap_or(0))),
    ]
}

/// View/Edit links and a Delete form posting `_method=DELETE`
pub fn action_markup(id: i64) -> String {
    format!(
        concat!(
            r#"<a href="/tasks/{id}" class="govuk-link">View</a> | "#,
            r#"<a href="/tasks/{id}/edit" class="govuk-link">Edit</a> | "#,
            r#"<form method="post" action="/tasks/{id}?_method=DELETE" class="inline-form">"#,
            r#"<input type="hidden" name="_method" value="DELETE">"#,
            r#"<button type="submit" class="govuk-link link-button">Delete</button>"#,
            "</form>"
        ),
        id = id
    )
}

/// Status choice offered by the task form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Field values shown in the task form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskFormValues {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_day: String,
    pub due_month: String,
    pub due_year: String,
}

impl TaskFormValues {
    /// Prefill the form from a task fetched for editing
    pub fn from_task(id: &str, task: &Task) -> Self {
        let (due_year, due_month, due_day) = task
            .due_date
            .as_deref()
            .map(split_date)
            .unwrap_or_default();

        Self {
            id: Some(task.id.map_or_else(|| id.to_string(), |n| n.to_string())),
            title: task.title.clone().unwrap_or_default(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.clone().unwrap_or_default(),
            due_day,
            due_month,
            due_year,
        }
    }
}

/// Split `YYYY-MM-DD` (optionally followed by a time part) into its fields
fn split_date(raw: &str) -> (String, String, String) {
    let date = raw.split('T').next().unwrap_or_default();
    let mut parts = date.splitn(3, '-').map(str::to_string);
    (
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    )
}

/// Context of the `task-form` template
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub task: TaskFormValues,
    /// `true` when the form edits an existing task
    pub editing: bool,
    /// Where the form posts to
    pub action: String,
    pub statuses: Vec<StatusOption>,
    pub error: Option<String>,
}

impl FormView {
    pub fn new(task: TaskFormValues, error: Option<&str>) -> Self {
        let editing = task.id.is_some();
        let action = task
            .id
            .as_ref()
            .map_or_else(|| "/tasks".to_string(), |id| format!("/tasks/{id}"));
        let current = if task.status.is_empty() {
            TaskStatus::Todo.as_str()
        } else {
            task.status.as_str()
        };
        let mut statuses: Vec<StatusOption> = TaskStatus::ALL
            .iter()
            .map(|status| StatusOption {
                value: status.as_str().to_string(),
                label: status.label().to_string(),
                selected: status.as_str() == current,
            })
            .collect();
        // Keep an unrecognised status selectable so saving does not overwrite it
        if !statuses.iter().any(|option| option.selected) {
            statuses.push(StatusOption {
                value: current.to_string(),
                label: current.to_string(),
                selected: true,
            });
        }

        Self {
            task,
            editing,
            action,
            statuses,
            error: error.map(str::to_string),
        }
    }

    pub fn blank() -> Self {
        Self::new(TaskFormValues::default(), None)
    }
}

/// Task fields prepared for the `task-details` template
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: String,
}

/// Context of the `task-details` template
#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub task: TaskDetail,
}

impl DetailView {
    pub fn from_task(id: &str, task: &Task) -> Self {
        Self {
            task: TaskDetail {
                id: task.id.map_or_else(|| id.to_string(), |n| n.to_string()),
                title: task.title.clone().unwrap_or_default(),
                description: task.description.clone().unwrap_or_default(),
                status: status_label(task.status.as_deref()),
                due_date: task.due_date.clone().unwrap_or_default(),
            },
        }
    }
}

/// Context of the `not-found` template
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundView {
    pub message: String,
}

impl NotFoundView {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
