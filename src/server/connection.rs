// Connection handling module
// Accepts a single TCP connection and serves it over HTTP/1.1

use std::cell::Cell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// The counter is incremented before the limit check so two racing accepts
/// cannot both slip under it.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Requests in flight on one connection and when the last one finished
struct Activity {
    in_flight: Cell<usize>,
    last_done: Cell<Instant>,
}

impl Activity {
    fn new() -> Self {
        Self {
            in_flight: Cell::new(0),
            last_done: Cell::new(Instant::now()),
        }
    }

    fn begin(&self) {
        self.in_flight.set(self.in_flight.get() + 1);
    }

    fn end(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        self.last_done.set(Instant::now());
    }

    /// When the connection becomes idle for `limit`, assuming nothing new arrives
    fn idle_deadline(&self, limit: Duration) -> Instant {
        if self.in_flight.get() > 0 {
            Instant::now() + limit
        } else {
            self.last_done.get() + limit
        }
    }

    fn idle_for(&self, limit: Duration) -> bool {
        self.in_flight.get() == 0 && self.last_done.get().elapsed() >= limit
    }
}

/// Serve one connection on the local task set.
///
/// Only the request head read is bounded (`read_timeout`). A request in
/// flight has no deadline, so a slow task service still ends in a rendered
/// page. Idle keep-alive connections are closed after `keep_alive_timeout`.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let idle_limit =
            (perf.keep_alive_timeout > 0).then(|| Duration::from_secs(perf.keep_alive_timeout));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(perf.read_timeout))
            .keep_alive(idle_limit.is_some());

        let activity = Rc::new(Activity::new());
        let service_activity = Rc::clone(&activity);
        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let activity = Rc::clone(&service_activity);
                async move {
                    activity.begin();
                    let response = handler::handle_request(req, peer_addr, state).await;
                    activity.end();
                    response
                }
            }),
        );
        let mut conn = std::pin::pin!(conn);

        let result = match idle_limit {
            None => conn.await,
            Some(limit) => loop {
                tokio::select! {
                    res = conn.as_mut() => break res,
                    () = tokio::time::sleep_until(activity.idle_deadline(limit)) => {
                        if activity.idle_for(limit) {
                            logger::log_debug(&format!(
                                "[Connection] Closing idle keep-alive connection from {peer_addr}"
                            ));
                            conn.as_mut().graceful_shutdown();
                            break conn.as_mut().await;
                        }
                    }
                }
            },
        };

        if let Err(err) = result {
            if err.is_timeout() {
                logger::log_warning(&format!(
                    "Request head from {peer_addr} not received within {} seconds",
                    state.config.performance.read_timeout
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
