//! # Backoff policy for retry delays.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated failures.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay for attempt `n` is computed as `first × factor^n`, clamped to
//! `max`, then jitter is applied. The base delay is derived purely from the
//! attempt number, so jitter output never feeds back into subsequent
//! calculations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use jobwatch::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(3),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! // Attempt 0 — uses 'first' (1s)
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! // Attempt 1 — 1s × 2^1 = 2s
//! assert_eq!(backoff.next(1), Duration::from_secs(2));
//! // Attempt 2 — 4s → capped at max=3s
//! assert_eq!(backoff.next(2), Duration::from_secs(3));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
///
/// Encapsulates the parameters that determine how retry delays grow:
/// - [`BackoffPolicy::first`] — the initial delay;
/// - [`BackoffPolicy::factor`] — multiplicative growth factor;
/// - [`BackoffPolicy::max`] — the maximum delay cap.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to prevent thundering herd.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 500ms`;
    /// - `factor = 2.0`;
    /// - `max = 30s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to
    /// [`BackoffPolicy::max`], with jitter applied on top. Each attempt
    /// derives its base independently, so a jittered result is never fed
    /// back into the next calculation.
    ///
    /// ### Notes
    /// - `factor = 1.0` keeps the delay constant at `first` (up to `max`).
    /// - Overflowing or non-finite intermediate values clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.apply(base)
    }
}
