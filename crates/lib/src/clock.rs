//! Time provider abstraction
//!
//! Session expiry and user creation timestamps read the time through a
//! [`Clock`] so tests can move time forward without sleeping.
//!
//! ```
//! use currex::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! assert!(clock.now_secs() > 0);
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Get current time as seconds since Unix epoch.
    fn now_secs(&self) -> i64 {
        (self.now_millis() / 1000) as i64
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests.
///
/// Unlike [`SystemClock`] it never moves on its own: call [`FixedClock::advance`]
/// or [`FixedClock::set`] to change the reported time.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicU64,
}

#[cfg(test)]
impl FixedClock {
    /// Create a clock reporting `millis` since the epoch.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.millis.store(ms, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}
