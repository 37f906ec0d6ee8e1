//! The per-request dispatch pipeline.
//!
//! A request moves through `Received -> Parsed | Rejected`,
//! `Parsed -> Suppressed | Dispatching` and
//! `Dispatching -> Delivered | DispatchFailed`. A delivered notification is
//! then mirrored when a mirror is configured; the mirror's result never
//! changes the outcome.

use crate::{
    config::{Config, Period},
    core::{Clock, Mirror, NotificationRequest, Notifier, SystemClock},
    event_log::{EventLog, TracingEventLog},
    internal_metrics::Metrics,
    mirror::ElasticsearchMirror,
    notification::ProwlClient,
    quiet_hours,
};
use anyhow::Result;
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// How a well-formed request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent upstream; any configured mirror has been attempted.
    Delivered,
    /// Dropped because it arrived during quiet hours.
    Suppressed,
}

impl DispatchOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchOutcome::Delivered => StatusCode::OK,
            DispatchOutcome::Suppressed => StatusCode::NO_CONTENT,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered => "delivered",
            DispatchOutcome::Suppressed => "suppressed",
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("malformed request path: expected 4 segments, got {segments}")]
    MalformedRequest { segments: usize },

    #[error("Prowl request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn label(&self) -> &'static str {
        match self {
            DispatchError::MalformedRequest { .. } => "rejected",
            DispatchError::Upstream(_) => "failed",
        }
    }
}

/// Runs inbound requests through parsing, quiet hours, delivery and mirroring.
pub struct Dispatcher {
    periods: Vec<Period>,
    notifier: Arc<dyn Notifier>,
    mirror: Option<Arc<dyn Mirror>>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn EventLog>,
    metrics: Metrics,
}

impl Dispatcher {
    /// Creates a new `DispatcherBuilder` to construct a `Dispatcher`.
    pub fn builder(config: Arc<Config>) -> DispatcherBuilder {
        DispatcherBuilder::new(config)
    }

    /// Handles one inbound request path.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, path: &str) -> Result<DispatchOutcome, DispatchError> {
        self.metrics.notifications_received_total.increment(1);
        let result = self.run(path).await;
        match &result {
            Ok(outcome) => self.metrics.record_outcome(outcome.label()),
            Err(e) => self.metrics.record_outcome(e.label()),
        }
        result
    }

    async fn run(&self, path: &str) -> Result<DispatchOutcome, DispatchError> {
        let request = NotificationRequest::from_path(path)?;

        if quiet_hours::is_suppressed(&self.clock.now(), &self.periods) {
            info!(
                application = %request.app_name,
                event = %request.event,
                "Notification suppressed by quiet hours"
            );
            return Ok(DispatchOutcome::Suppressed);
        }

        let start = Instant::now();
        let sent = self.notifier.notify(&request).await;
        self.metrics
            .prowl_dispatch_duration_seconds
            .record(start.elapsed().as_secs_f64());
        if let Err(e) = sent {
            warn!(error = %e, "Notification delivery failed");
            return Err(e);
        }

        self.mirror_delivered(&request).await;
        Ok(DispatchOutcome::Delivered)
    }

    /// Mirrors a delivered notification. Failures are logged and dropped.
    async fn mirror_delivered(&self, request: &NotificationRequest) {
        let Some(mirror) = &self.mirror else {
            debug!("No mirror configured, skipping.");
            return;
        };

        match mirror.mirror(request, self.clock.now()).await {
            Ok(()) => self.metrics.record_mirror_write("ok"),
            Err(e) => {
                self.metrics.record_mirror_write("error");
                self.log
                    .error(&format!("Unable to mirror notification: {}", e));
            }
        }
    }
}

/// Builder for the dispatcher.
///
/// By default the collaborators are built from the configuration; each one can
/// be overridden, which is how tests pin the clock or observe the log.
pub struct DispatcherBuilder {
    config: Arc<Config>,
    notifier_override: Option<Arc<dyn Notifier>>,
    mirror_override: Option<Arc<dyn Mirror>>,
    clock_override: Option<Arc<dyn Clock>>,
    event_log_override: Option<Arc<dyn EventLog>>,
    metrics: Option<Metrics>,
}

impl DispatcherBuilder {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            notifier_override: None,
            mirror_override: None,
            clock_override: None,
            event_log_override: None,
            metrics: None,
        }
    }

    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    pub fn mirror_override(mut self, mirror: Arc<dyn Mirror>) -> Self {
        self.mirror_override = Some(mirror);
        self
    }

    pub fn clock_override(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock_override = Some(clock);
        self
    }

    pub fn event_log_override(mut self, log: Arc<dyn EventLog>) -> Self {
        self.event_log_override = Some(log);
        self
    }

    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let config = self.config;
        let log: Arc<dyn EventLog> = self
            .event_log_override
            .unwrap_or_else(|| Arc::new(TracingEventLog::new(config.host.clone())));

        let notifier: Arc<dyn Notifier> = match self.notifier_override {
            Some(notifier) => notifier,
            None => Arc::new(ProwlClient::new(
                config.prowl_url.clone(),
                config.token.clone(),
                config.request_timeout(),
            )?),
        };

        let mirror: Option<Arc<dyn Mirror>> = match (self.mirror_override, config.mirror_url()) {
            (Some(mirror), _) => Some(mirror),
            (None, Some(url)) => Some(Arc::new(ElasticsearchMirror::new(
                url,
                config.host.clone(),
                config.request_timeout(),
                log.clone(),
            )?)),
            (None, None) => None,
        };

        Ok(Dispatcher {
            periods: config.ignore.clone(),
            notifier,
            mirror,
            clock: self.clock_override.unwrap_or_else(|| Arc::new(SystemClock)),
            log,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}
