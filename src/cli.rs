use clap::Parser;

/// Default config file, resolved by the `config` crate without extension
pub const DEFAULT_CONFIG: &str = "config";

/// tasks-frontend: server-rendered pages for a remote task service
#[derive(Parser, Debug, Clone)]
#[command(name = "tasks-frontend", version, about)]
pub struct Cli {
    /// Config file path without extension (e.g. `config` for `config.toml`)
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG)]
    pub config: String,
}
