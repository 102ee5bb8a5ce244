//! Clock abstraction for timestamps on tasks, entities, and call records.

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
///
/// Injected wherever a timestamp is persisted so tests can pin it.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
