use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod model;
mod server;
mod views;

use client::HttpTaskClient;
use server::{create_listener, start_server_loop, start_signal_handler, Shutdown};
use views::ViewEngine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();
    let cfg = config::Config::load_from(&cli.config)?;
    logger::init(&cfg)?;

    // Single-threaded runtime; connections run on a LocalSet
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let tasks = Arc::new(HttpTaskClient::new(
        cfg.task_api_base(),
        cfg.task_api_timeout(),
    ));
    let views = ViewEngine::new(cfg.views.template_dir.as_deref())?;
    let state = Arc::new(config::AppState::new(&cfg, tasks, views));

    let listener = create_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Shutdown::new());
    let active_connections = Arc::new(AtomicUsize::new(0));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            start_signal_handler(Arc::clone(&shutdown));
            start_server_loop(listener, state, active_connections, shutdown).await;
        })
        .await;

    Ok(())
}
