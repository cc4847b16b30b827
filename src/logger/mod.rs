//! Logger module
//!
//! Provides logging utilities for the front end including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Remote-call failures with their error chain
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use std::error::Error as StdError;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls
/// back to `info`.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, using info");
        Level::Info
    });
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_info(level, message),
        None => println!("{message}"),
    }
}

fn write_error(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_error(level, message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(Level::Info, "======================================");
    write_info(Level::Info, "Task front end started successfully");
    write_info(Level::Info, &format!("Listening on: http://{addr}"));
    write_info(
        Level::Info,
        &format!("Task service: {}", config.task_api_base()),
    );
    match config.task_api.request_timeout {
        Some(secs) => write_info(Level::Info, &format!("Task service timeout: {secs}s")),
        None => write_info(Level::Info, "Task service timeout: none"),
    }
    if let Some(ref dir) = config.views.template_dir {
        write_info(Level::Info, &format!("Template overrides: {dir}"));
    }
    write_info(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(Level::Info, &format!("Error log: {path}"));
    }
    write_info(Level::Info, "======================================\n");
}

pub fn log_info(message: &str) {
    write_info(Level::Info, message);
}

pub fn log_debug(message: &str) {
    write_info(Level::Debug, message);
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

/// Log an error followed by one line per error in its `source()` chain
pub fn log_error_chain(context: &str, err: &(dyn StdError + 'static)) {
    write_error(Level::Error, &format!("[ERROR] {context}: {err}"));
    let mut source = err.source();
    while let Some(cause) = source {
        write_error(Level::Error, &format!("        caused by: {cause}"));
        source = cause.source();
    }
}

pub fn log_method_override(original: &str, effective: &str) {
    write_info(
        Level::Info,
        &format!("[Override] _method={effective} rewrites {original}"),
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_shutdown(reason: &str) {
    write_info(Level::Info, &format!("[Shutdown] {reason}, no longer accepting connections"));
}
