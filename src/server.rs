//! The inbound HTTP listener.
//!
//! Every path and method is routed to the dispatcher; the path shape is
//! validated there. Dispatch runs on its own task so that a client hanging
//! up does not cancel an outbound call already in flight.

use crate::dispatch::Dispatcher;
use axum::{extract::State, http::StatusCode, http::Uri, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Builds the relay's router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .fallback(handle_notification)
        .with_state(dispatcher)
}

async fn handle_notification(State(dispatcher): State<Arc<Dispatcher>>, uri: Uri) -> StatusCode {
    let path = uri.path().to_owned();
    let task = tokio::spawn(async move { dispatcher.dispatch(&path).await });

    match task.await {
        Ok(Ok(outcome)) => outcome.status_code(),
        Ok(Err(e)) => {
            warn!(path = %uri.path(), error = %e, "Request not delivered");
            e.status_code()
        }
        Err(e) => {
            error!(error = %e, "Dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// The relay's HTTP server.
pub struct RelayServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown_rx: watch::Receiver<()>,
}

impl RelayServer {
    /// Creates a new `RelayServer` but does not start serving.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `dispatcher` - The pipeline every request is handed to.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(
        listener: TcpListener,
        dispatcher: Arc<Dispatcher>,
        shutdown_rx: watch::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            dispatcher,
            shutdown_rx,
        }
    }

    /// Serves requests until the shutdown signal is received.
    pub async fn run(self) -> std::io::Result<()> {
        let mut shutdown_rx = self.shutdown_rx;
        if let Ok(addr) = self.listener.local_addr() {
            info!("Relay listening on {}", addr);
        }
        axum::serve(self.listener, router(self.dispatcher))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("Relay server received shutdown signal.");
            })
            .await
    }
}
