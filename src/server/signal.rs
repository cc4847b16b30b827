// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown request shared between the signal task and the accept loop
pub struct Shutdown {
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Request shutdown. The permit is kept if the loop is not waiting yet.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the signal listener task (Unix)
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Shutdown>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::task::spawn_local(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("Failed to register signal handlers: {e}"));
                    return;
                }
            };

        logger::log_debug(&format!(
            "[Signal] SIGTERM/SIGINT handlers registered, pid {}",
            std::process::id()
        ));

        let reason = tokio::select! {
            _ = sigterm.recv() => "SIGTERM received",
            _ = sigint.recv() => "SIGINT received",
        };
        logger::log_shutdown(reason);
        shutdown.trigger();
    });
}

/// Fallback for other platforms: Ctrl+C only
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Shutdown>) {
    tokio::task::spawn_local(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_shutdown("Ctrl+C received");
            shutdown.trigger();
        }
    });
}
