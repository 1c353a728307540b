//! Timestamp providers for sealing.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Source of block timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> String;
}

/// Wall clock, RFC3339 in UTC with nanosecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        let now = OffsetDateTime::now_utc();
        now.format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp_nanos().to_string())
    }
}

/// Always returns the same timestamp. Used for reproducible digests.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}
