//! Exponential backoff calculator for reconnect attempts
//!
//! Implements exponential backoff with optional jitter for retry delays,
//! preventing thundering herd problems when many clients reconnect.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff strategy for reconnect attempts.
///
/// Calculates delays that grow exponentially with each attempt,
/// up to a configurable maximum. Includes optional jitter to
/// prevent synchronized retry storms.
///
/// # Example
///
/// ```
/// use wdb_connection::reconnect::BackoffStrategy;
/// use std::time::Duration;
///
/// let backoff = BackoffStrategy::new(100, 30_000);
///
/// // First attempt: 100ms
/// assert_eq!(backoff.calculate_delay(0), Duration::from_millis(100));
///
/// // Second attempt: 200ms
/// assert_eq!(backoff.calculate_delay(1), Duration::from_millis(200));
///
/// // Delay grows exponentially but is capped at max
/// let delay = backoff.calculate_delay(20);
/// assert!(delay <= Duration::from_millis(30_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffStrategy {
    /// Initial delay in milliseconds for the first retry
    initial_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential growth)
    max_ms: u64,
    /// Multiplier for exponential growth (default: 2.0)
    multiplier: f64,
    /// Whether to add jitter to delays (default: false for predictable testing)
    jitter: bool,
}

impl BackoffStrategy {
    /// Create a new backoff strategy with the given initial and maximum delays.
    ///
    /// The initial delay is at least 1ms and the maximum is never below
    /// the initial delay. Use [`BackoffStrategy::none`] for no delay at all.
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        let initial_ms = initial_ms.max(1);
        Self {
            initial_ms,
            max_ms: max_ms.max(initial_ms),
            multiplier: 2.0,
            jitter: false,
        }
    }

    /// Redial immediately after every failure.
    ///
    /// ```
    /// use wdb_connection::reconnect::BackoffStrategy;
    ///
    /// assert!(BackoffStrategy::none().calculate_delay(7).is_zero());
    /// ```
    pub fn none() -> Self {
        Self {
            initial_ms: 0,
            max_ms: 0,
            multiplier: 1.0,
            jitter: false,
        }
    }

    /// Set the multiplier for exponential growth.
    ///
    /// Default is 2.0 (delay doubles each attempt).
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Enable jitter of up to 25% in either direction.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay for a given attempt number.
    ///
    /// Attempt 0 returns the initial delay, with subsequent attempts
    /// growing exponentially up to the maximum.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if self.initial_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_ms = (self.initial_ms as f64) * self.multiplier.max(1.0).powi(exponent);
        let capped_ms = delay_ms.min(self.max_ms as f64) as u64;

        let final_ms = if self.jitter && capped_ms >= 4 {
            let jitter_range = capped_ms / 4;
            let offset = rand::thread_rng().gen_range(0..=jitter_range * 2);
            capped_ms.saturating_sub(jitter_range).saturating_add(offset)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms)
    }

    /// Get the initial delay.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    /// Get the maximum delay.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Get the multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Check if jitter is enabled.
    pub fn has_jitter(&self) -> bool {
        self.jitter
    }
}

impl Default for BackoffStrategy {
    /// Default backoff: 100ms initial, 30 seconds max, 2x multiplier
    fn default() -> Self {
        Self::new(100, 30_000)
    }
}
