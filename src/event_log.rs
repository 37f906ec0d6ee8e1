//! Injected logging capability for the dispatch pipeline.
//!
//! Components that report operational events (mirror writes, dispatch
//! failures) receive an `Arc<dyn EventLog>` instead of reaching for a global
//! logger, so tests can observe what was reported.

use tracing::{error, info};

/// A sink for operational log messages.
pub trait EventLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards events to `tracing`, tagged with the relay's host identifier.
#[derive(Debug, Clone)]
pub struct TracingEventLog {
    host: String,
}

impl TracingEventLog {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl EventLog for TracingEventLog {
    fn info(&self, message: &str) {
        info!(host = %self.host, "{}", message);
    }

    fn error(&self, message: &str) {
        error!(host = %self.host, "{}", message);
    }
}
