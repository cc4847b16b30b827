// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::Shutdown;
use crate::config::AppState;
use crate::logger;

/// Upper bound on waiting for in-flight connections after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop on the current `LocalSet`.
///
/// Returns once shutdown is requested and the in-flight connections have
/// finished, or the drain timeout has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Shutdown>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.wait() => break,
        }
    }

    drop(listener);
    drain_connections(&active_connections).await;
}

async fn drain_connections(active_connections: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_info("[Shutdown] All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "[Shutdown] Giving up on {active} open connection(s) after {}s",
                DRAIN_TIMEOUT.as_secs()
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
