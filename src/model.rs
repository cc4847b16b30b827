//! Task wire types
//!
//! Shapes exchanged with the remote task service. Decoding is lenient: a
//! field the service leaves out is `None`, never a decode failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow state of a task as spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Wire spelling (`TODO`, `IN_PROGRESS`, `COMPLETED`)
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Human label shown in views
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Display label for a raw status value.
///
/// Known statuses map to their label, unknown ones render as themselves and
/// a missing or empty status renders as `N/A`.
pub fn status_label(raw: Option<&str>) -> String {
    match raw.filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<TaskStatus>()
            .map_or_else(|_| s.to_string(), |status| status.label().to_string()),
        None => "N/A".to_string(),
    }
}

/// A task as returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept raw so that statuses unknown to this front end still display
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    /// Sent as `null` when the form carried no day
    pub due_date: Option<String>,
}

/// Body of `PATCH /tasks/:id`; only the status is updatable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
