//! Outbound delivery of notifications to the push service.
pub mod prowl;

pub use prowl::ProwlClient;
