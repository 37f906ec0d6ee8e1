//! Prowl relay - forwards HTTP-triggered events to Prowl
//!
//! This library provides the notification pipeline: request parsing, the
//! quiet-hours policy, delivery to Prowl and best-effort mirroring into an
//! Elasticsearch-compatible store.

pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod event_log;
pub mod internal_metrics;
pub mod mirror;
pub mod notification;
pub mod quiet_hours;
pub mod server;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher};
