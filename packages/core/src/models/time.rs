//! Time Provider Abstraction
//!
//! Provides a trait-based abstraction for time operations so node timestamps and
//! autosave bookkeeping can be tested deterministically without thread sleeps.
//!
//! # Examples
//!
//! ```rust
//! use outline_core::models::time::{TimeProvider, SystemTimeProvider};
//! use chrono::Utc;
//!
//! let provider = SystemTimeProvider;
//! let now = provider.now();
//! assert!(now <= Utc::now());
//! ```

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Trait for providing current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider using actual system clock
///
/// This is the default implementation for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven time provider
///
/// Shared behind an `Arc` between a node store and a test, so the test can move
/// time forward while the store keeps reading it.
///
/// # Examples
///
/// ```rust
/// use outline_core::models::time::{TimeProvider, ManualTimeProvider};
/// use chrono::Duration;
///
/// let provider = ManualTimeProvider::new();
/// let time1 = provider.now();
///
/// provider.advance(Duration::hours(1));
/// let time2 = provider.now();
///
/// assert_eq!(time2 - time1, Duration::hours(1));
/// ```
#[derive(Debug)]
pub struct ManualTimeProvider {
    current_time: Mutex<DateTime<Utc>>,
}

impl ManualTimeProvider {
    /// Create a manual time provider starting at the current time
    pub fn new() -> Self {
        Self::with_time(Utc::now())
    }

    /// Create a manual time provider with a specific starting time
    pub fn with_time(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Mutex::new(time),
        }
    }

    /// Set the current time to a specific value
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.lock() = time;
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: chrono::Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid timestamp
        self.current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

impl Default for ManualTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}
