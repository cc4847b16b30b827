//! Form decoding module
//!
//! Decodes `application/x-www-form-urlencoded` bodies and query strings,
//! resolves the `_method` override and builds task payloads from form fields.

use std::collections::HashMap;

use hyper::Method;

use crate::model::{NewTask, TaskPatch, TaskStatus};
use crate::views::TaskFormValues;

/// Field carrying the override verb
pub const METHOD_FIELD: &str = "_method";

const DUE_DAY: &str = "dueDate-day";
const DUE_MONTH: &str = "dueDate-month";
const DUE_YEAR: &str = "dueDate-year";

/// Decoded form fields; the first occurrence of a repeated key wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn parse(input: &[u8]) -> Self {
        let mut fields = HashMap::new();
        for (key, value) in form_urlencoded::parse(input) {
            fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { fields }
    }

    pub fn from_query(query: Option<&str>) -> Self {
        query.map_or_else(Self::default, |q| Self::parse(q.as_bytes()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Field value, treating an empty string as missing
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

/// Resolve the `_method` override of a request.
///
/// Only `POST` requests can be overridden. The body field wins over the
/// query parameter. Returns `None` when no override applies.
pub fn method_override(method: &Method, body: &FormData, query: &FormData) -> Option<Method> {
    if method != Method::POST {
        return None;
    }

    let requested = body
        .non_empty(METHOD_FIELD)
        .or_else(|| query.non_empty(METHOD_FIELD))?;
    let upper = requested.trim().to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes())
        .ok()
        .filter(|effective| effective != method)
}

/// Assemble a due date from the three date fields.
///
/// No day means no due date. Numeric parts are zero-padded to
/// `YYYY-MM-DD`; anything else is joined as typed.
pub fn due_date(form: &FormData) -> Option<String> {
    let day = form.non_empty(DUE_DAY)?.trim();
    let month = form.get(DUE_MONTH).unwrap_or_default().trim();
    let year = form.get(DUE_YEAR).unwrap_or_default().trim();

    match (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => Some(format!("{y:04}-{m:02}-{d:02}")),
        _ => Some(format!("{year}-{month}-{day}")),
    }
}

/// Create payload; status defaults to `TODO`
pub fn new_task(form: &FormData) -> NewTask {
    NewTask {
        title: form.get("title").map(str::to_string),
        description: form.get("description").map(str::to_string),
        status: form
            .non_empty("status")
            .unwrap_or(TaskStatus::Todo.as_str())
            .to_string(),
        due_date: due_date(form),
    }
}

/// Update payload; only the status travels
pub fn task_patch(form: &FormData) -> TaskPatch {
    TaskPatch {
        status: form.get("status").map(str::to_string),
    }
}

/// Submitted values, used to redisplay a form after a failure
pub fn form_values(form: &FormData, id: Option<&str>) -> TaskFormValues {
    let field = |key: &str| form.get(key).unwrap_or_default().to_string();
    TaskFormValues {
        id: id.map(str::to_string),
        title: field("title"),
        description: field("description"),
        status: field("status"),
        due_day: field(DUE_DAY),
        due_month: field(DUE_MONTH),
        due_year: field(DUE_YEAR),
    }
}
