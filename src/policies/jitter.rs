//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that concurrent
//! retriers (many jobs hitting the same provider) do not wake up in lockstep.
//!
//! - [`JitterPolicy::None`] — no randomization, predictable delays
//! - [`JitterPolicy::Additive`] — delay + random[0, delay/4]
//!
//! Jitter exists purely to desynchronize the herd; it is never required for
//! correctness, which is why the additive spread is bounded at a quarter of
//! the computed delay rather than rewriting the whole schedule.

use rand::Rng;
use std::time::Duration;

/// Fraction of the base delay the additive jitter may add on top.
const ADDITIVE_SPREAD: f64 = 0.25;

/// Policy controlling randomization of retry delays.
///
/// ## Trade-offs
/// - **None**: predictable timing; fine for a single retrier and for tests
/// - **Additive**: spreads concurrent retriers over `[delay, 1.25 × delay]`
///   while keeping the schedule recognizable (recommended for shared
///   providers)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    #[default]
    None,

    /// Additive jitter: delay + random[0, delay/4].
    ///
    /// The delay never shrinks below the computed base, so backoff ordering
    /// between attempts is preserved.
    Additive,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Additive => self.additive_jitter(delay),
        }
    }

    /// Additive jitter: delay + random[0, delay/4].
    fn additive_jitter(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        let spread = (ms as f64 * ADDITIVE_SPREAD) as u64;
        if spread == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        delay + Duration::from_millis(rng.random_range(0..=spread))
    }
}
