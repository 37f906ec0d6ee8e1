//! # Internal Metrics Module
//!
//! Collection and exposition of relay metrics.
//!
//! - **`MetricsBuilder`**: installs the Prometheus recorder, binds the
//!   metrics listener and constructs the `Metrics` handle.
//! - **`Metrics`**: a cloneable handle the dispatch pipeline records through.
//! - **`MetricsServer`**: (defined in `server.rs`) serves `/metrics`.

use crate::config::MetricsConfig;
use crate::internal_metrics::server::MetricsServer;
use metrics::{Counter, Histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::error;

pub mod server;

/// The public API for the metrics system.
///
/// Without an installed recorder every handle is a no-op, which is what unit
/// and integration tests run against.
#[derive(Clone)]
pub struct Metrics {
    pub notifications_received_total: Counter,
    pub prowl_dispatch_duration_seconds: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("notifications_received_total", Unit::Count, "Total number of inbound notification requests.");
        metrics::describe_counter!("notifications_outcome_total", Unit::Count, "Inbound requests by terminal outcome (delivered, suppressed, rejected, failed).");
        metrics::describe_counter!("mirror_writes_total", Unit::Count, "Mirror writes attempted, labeled by result.");
        metrics::describe_histogram!("prowl_dispatch_duration_seconds", Unit::Seconds, "Latency of calls to the Prowl API.");

        Self {
            notifications_received_total: metrics::counter!("notifications_received_total"),
            prowl_dispatch_duration_seconds: metrics::histogram!("prowl_dispatch_duration_seconds"),
        }
    }

    /// Increments the counter for a request's terminal outcome.
    pub fn record_outcome(&self, outcome: &'static str) {
        metrics::counter!("notifications_outcome_total", "outcome" => outcome).increment(1);
    }

    /// Increments the counter for a mirror write with the given result.
    pub fn record_mirror_write(&self, result: &'static str) {
        metrics::counter!("mirror_writes_total", "result" => result).increment(1);
    }
}

/// Builder for the metrics system.
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Initializes the metrics system and returns a `Metrics` handle and an
    /// optional `MetricsServer` with its bound address.
    ///
    /// If metrics are disabled, or the exporter cannot be set up, the returned
    /// handle records nothing and no server is returned.
    pub fn build(
        self,
        shutdown_rx: watch::Receiver<()>,
    ) -> (Metrics, Option<(MetricsServer, SocketAddr)>) {
        if !self.config.enabled {
            return (Metrics::new(), None);
        }

        let recorder = match PrometheusBuilder::new().set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        ) {
            Ok(builder) => builder.build_recorder(),
            Err(e) => {
                error!("Failed to configure Prometheus recorder: {}", e);
                return (Metrics::new(), None);
            }
        };
        let handle = recorder.handle();

        let listener = match std::net::TcpListener::bind(self.config.listen_address) {
            Ok(listener) => listener,
            Err(e) => {
                error!(
                    "Failed to bind metrics server to {}: {}",
                    self.config.listen_address, e
                );
                return (Metrics::new(), None);
            }
        };

        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                error!("Failed to get local address for metrics server: {}", e);
                return (Metrics::new(), None);
            }
        };

        // The listener must be non-blocking to be used with Tokio.
        let listener = match listener
            .set_nonblocking(true)
            .and_then(|_| TcpListener::from_std(listener))
        {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to hand metrics listener to Tokio: {}", e);
                return (Metrics::new(), None);
            }
        };

        if let Err(e) = metrics::set_global_recorder(recorder) {
            error!("Failed to install Prometheus recorder: {}", e);
            return (Metrics::new(), None);
        }

        let metrics = Metrics::new();
        let server = MetricsServer::new(listener, handle, shutdown_rx);

        (metrics, Some((server, addr)))
    }
}
