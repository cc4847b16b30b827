//! View rendering module
//!
//! Owns the template engine. Default templates are compiled into the binary;
//! a `<template_dir>/<name>.html` file replaces the default of the same name.
//! Values are HTML-escaped unless piped through the `raw` formatter.

pub mod model;

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::logger;

pub use model::{DetailView, FormView, HomeView, NotFoundView, TaskFormValues};

pub const HOME: &str = "home";
pub const TASK_FORM: &str = "task-form";
pub const TASK_DETAILS: &str = "task-details";
pub const NOT_FOUND: &str = "not-found";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("header", include_str!("templates/header.html")),
    ("footer", include_str!("templates/footer.html")),
    (HOME, include_str!("templates/home.html")),
    (TASK_FORM, include_str!("templates/task-form.html")),
    (TASK_DETAILS, include_str!("templates/task-details.html")),
    (NOT_FOUND, include_str!("templates/not-found.html")),
];

/// Compiled view templates
pub struct ViewEngine {
    engine: upon::Engine<'static>,
}

impl ViewEngine {
    /// Compile every template, preferring overrides from `template_dir`
    pub fn new(template_dir: Option<&str>) -> Result<Self> {
        let mut engine = upon::Engine::new();
        engine.set_default_formatter(&escape_html);
        engine.add_formatter("raw", raw);

        for (name, default) in DEFAULT_TEMPLATES {
            let source = match load_override(template_dir, name) {
                Some(source) => source,
                None => (*default).to_string(),
            };
            engine.add_template(*name, source)?;
        }

        Ok(Self { engine })
    }

    /// Render the named template with `ctx`
    pub fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<String> {
        let template = self
            .engine
            .get_template(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_string()))?;
        Ok(template.render(ctx).to_string()?)
    }
}

/// Read `<dir>/<name>.html` if it exists and is readable
fn load_override(template_dir: Option<&str>, name: &str) -> Option<String> {
    let path = Path::new(template_dir?).join(format!("{name}.html"));
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(source) => {
            logger::log_info(&format!("[Views] Using template override {}", path.display()));
            Some(source)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to read template override {}: {e}, using built-in",
                path.display()
            ));
            None
        }
    }
}

/// Default formatter: strings are HTML-escaped, other values written as-is
fn escape_html(f: &mut upon::fmt::Formatter<'_>, value: &upon::Value) -> upon::fmt::Result {
    match value {
        upon::Value::String(s) => {
            for c in s.chars() {
                match c {
                    '&' => f.write_str("&amp;")?,
                    '<' => f.write_str("&lt;")?,
                    '>' => f.write_str("&gt;")?,
                    '"' => f.write_str("&quot;")?,
                    '\'' => f.write_str("&#x27;")?,
                    c => f.write_char(c)?,
                }
            }
        }
        other => upon::fmt::default(f, other)?,
    }
    Ok(())
}

/// Write strings unescaped; used for cells that carry markup
fn raw(f: &mut upon::fmt::Formatter<'_>, value: &upon::Value) -> upon::fmt::Result {
    match value {
        upon::Value::String(s) => f.write_str(s)?,
        other => upon::fmt::default(f, other)?,
    }
    Ok(())
}
