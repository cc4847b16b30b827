// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use state::AppState;
pub use types::Config;

/// Environment variable prefix, e.g. `TASKS_TASK_API__BASE_URL`
const ENV_PREFIX: &str = "TASKS";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The CLI passes `config` unless `--config` names another file
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3100)?
            .set_default("task_api.base_url", "http://localhost:4000")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "tasks-frontend")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Base URL of the task service with any trailing slash removed
    pub fn task_api_base(&self) -> &str {
        self.task_api.base_url.trim_end_matches('/')
    }

    pub fn task_api_timeout(&self) -> Option<Duration> {
        self.task_api.request_timeout.map(Duration::from_secs)
    }
}
