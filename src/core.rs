//! Core domain types and service traits for the relay
//!
//! This module defines the inbound notification request and the trait
//! contracts between the dispatch pipeline and its outbound collaborators.

use crate::dispatch::DispatchError;
use crate::mirror::MirrorError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};

/// A notification trigger parsed from an inbound request path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationRequest {
    /// The application that raised the event.
    pub app_name: String,
    /// Short name of the event.
    pub event: String,
    /// Free-form description of the event.
    pub description: String,
}

impl NotificationRequest {
    /// Number of segments a well-formed path splits into, counting the empty
    /// segment before the leading `/`.
    pub const PATH_SEGMENTS: usize = 4;

    /// Parses a request path of the form `/<app>/<event>/<description>`.
    ///
    /// Segments are taken verbatim: no trimming, no percent-decoding and no
    /// content validation. Empty segments are accepted as long as the segment
    /// count is right.
    pub fn from_path(path: &str) -> Result<Self, DispatchError> {
        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            [_, app_name, event, description] => Ok(Self {
                app_name: (*app_name).to_string(),
                event: (*event).to_string(),
                description: (*description).to_string(),
            }),
            _ => Err(DispatchError::MalformedRequest {
                segments: segments.len(),
            }),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a notification to the upstream push service.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Performs a single delivery attempt.
    ///
    /// # Returns
    /// * `Ok(())` once the upstream call completed a round-trip, whatever the
    ///   upstream status was
    /// * `Err` on transport failure (connection, timeout)
    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError>;
}

/// Writes a copy of a delivered notification to a secondary store.
#[async_trait]
pub trait Mirror: Send + Sync {
    /// Mirrors one delivered notification, stamped with `moment`.
    async fn mirror(
        &self,
        request: &NotificationRequest,
        moment: DateTime<FixedOffset>,
    ) -> Result<(), MirrorError>;
}

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The process's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
