//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of seeds for the per-operation random generators.
#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    fn next_seed(&self) -> u64;
}
