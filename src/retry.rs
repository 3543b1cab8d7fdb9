//! Retry policy with an injectable sleep, shared by the geocoder and
//! the risk classifier.
//!
//! Backoff is a fixed inter-attempt delay with no jitter; call volume
//! per run is bounded by route length, so nothing smarter is needed.
//! Tests inject a recording [`Sleep`] so no real time passes.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::SafeRouteError;

/// Sleep abstraction so retry delays can be faked in tests
pub trait Sleep {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the current thread
#[derive(Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Bounded retry with a fixed inter-attempt delay
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a new policy
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `operation` up to `max_attempts` times, sleeping `delay`
    /// between attempts. Errors for which `retryable` returns false are
    /// returned immediately; the last error is returned once attempts
    /// are exhausted.
    ///
    /// The closure receives the 1-based attempt number for logging.
    pub fn run<T, F, P>(
        &self,
        sleep: &dyn Sleep,
        what: &str,
        mut operation: F,
        retryable: P,
    ) -> Result<T, SafeRouteError>
    where
        F: FnMut(u32) -> Result<T, SafeRouteError>,
        P: Fn(&SafeRouteError) -> bool,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts.max(1) {
            match operation(attempt) {
                Ok(value) => {
                    debug!("{what} succeeded on attempt {attempt}/{}", self.max_attempts);
                    return Ok(value);
                }
                Err(err) if !retryable(&err) => {
                    debug!("{what} failed with non-retryable error: {err}");
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        "{what} failed on attempt {attempt}/{}: {err}",
                        self.max_attempts
                    );
                    last_error = Some(err);
                    if attempt < self.max_attempts {
                        sleep.sleep(self.delay);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SafeRouteError::provider(format!("{what} made no attempts"))))
    }
}
