//! Source of "today" for date-sensitive filters.

use time::{Date, OffsetDateTime};

/// Calendar clock queried once per filter invocation.
pub trait Clock: Send + Sync {
    /// The current calendar date.
    fn today(&self) -> Date;
}

/// Clock backed by the system time in the local offset.
///
/// Falls back to UTC when the local offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

/// Clock pinned to a fixed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
