//! Quiet-hours suppression policy.
//!
//! A [`Period`] is a time-of-day window encoded as `hour * 100 + minute`
//! (e.g. `1430` for 2:30 PM). Windows carry no date and cannot wrap past
//! midnight; a quiet night is configured as two periods.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// A suppression window, bounds inclusive.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct Period {
    #[serde(default)]
    pub from: u32,
    #[serde(default)]
    pub to: u32,
}

impl Period {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Returns `true` if the encoded time lies within `[from, to]`.
    pub fn contains(&self, encoded_time: u32) -> bool {
        self.from <= encoded_time && encoded_time <= self.to
    }
}

/// Encodes a time of day as `hour * 100 + minute`, so 09:05 becomes `905`.
pub fn encode_time<T: Timelike>(time: &T) -> u32 {
    time.hour() * 100 + time.minute()
}

/// Checks whether notifications raised at `now` should be dropped.
pub fn is_suppressed<T: Timelike>(now: &T, periods: &[Period]) -> bool {
    let encoded = encode_time(now);
    periods.iter().any(|period| period.contains(encoded))
}
