//! # Retry policy: how many times, how long between, and which errors.
//!
//! [`RetryPolicy`] bundles the knobs consulted by
//! [`retry_with_backoff`](crate::retry_with_backoff):
//! - `max_retries` — hard ceiling on re-invocations (attempt 0 is free);
//! - `backoff` — the delay schedule ([`BackoffPolicy`]);
//! - `should_retry` — pluggable predicate `(error, attempt) -> bool`;
//! - `on_retry` — observer hook `(error, next_attempt, delay)`, called before
//!   the sleep so the decision is visible even if the process dies mid-wait.
//!
//! ## Default classification
//! The default predicate retries transient failures
//! ([`CallError::is_transient`]) and refuses permanent and canceled ones.
//! Errors of unknown shape are retried at most [`UNKNOWN_RETRY_CAP`] times
//! regardless of the nominal `max_retries` — an unclassified error looping at
//! full budget is how retry storms start.
//!
//! ## Example
//! ```rust
//! use jobwatch::{BackoffPolicy, CallError, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, BackoffPolicy::default())
//!     .with_predicate(|err: &CallError, _attempt| err.is_transient());
//! assert_eq!(policy.max_retries, 3);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CallError;
use crate::policies::backoff::BackoffPolicy;
use crate::policies::jitter::JitterPolicy;

/// Retry ceiling applied to [`CallError::Unknown`] by the default predicate,
/// regardless of the policy's nominal `max_retries`.
pub const UNKNOWN_RETRY_CAP: u32 = 2;

/// Decides whether a failed attempt is worth retrying.
///
/// Receives the error and the 0-indexed attempt that just failed.
pub type RetryPredicate = Arc<dyn Fn(&CallError, u32) -> bool + Send + Sync>;

/// Observes a scheduled retry: `(error, next_attempt, delay)`.
///
/// `next_attempt` is 1-indexed (the attempt about to run). Invoked before the
/// backoff sleep.
pub type RetryHook = Arc<dyn Fn(&CallError, u32, Duration) + Send + Sync>;

/// Policy for retrying a fallible async operation.
///
/// Immutable per invocation; callers build one per call site (or share a
/// canned one — the type is cheaply cloneable).
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of re-invocations after the initial attempt.
    pub max_retries: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
    should_retry: RetryPredicate,
    on_retry: Option<RetryHook>,
}

impl RetryPolicy {
    /// Creates a policy with the default classification predicate.
    ///
    /// The default predicate retries transient errors, refuses permanent and
    /// canceled ones, and caps [`CallError::Unknown`] at
    /// [`UNKNOWN_RETRY_CAP`] attempts.
    pub fn new(max_retries: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_retries,
            backoff,
            should_retry: Arc::new(default_predicate),
            on_retry: None,
        }
    }

    /// Canned policy for absorbing transient provider failures:
    /// 3 retries, exponential backoff from 500ms capped at 10s, additive
    /// jitter.
    pub fn transient() -> Self {
        Self::new(
            3,
            BackoffPolicy {
                first: Duration::from_millis(500),
                max: Duration::from_secs(10),
                factor: 2.0,
                jitter: JitterPolicy::Additive,
            },
        )
    }

    /// Replaces the retry predicate.
    pub fn with_predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallError, u32) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(f);
        self
    }

    /// Installs an observer hook called before each backoff sleep.
    pub fn with_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallError, u32, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(f));
        self
    }

    /// Consults the predicate for the given failure.
    pub fn should_retry(&self, err: &CallError, attempt: u32) -> bool {
        (self.should_retry)(err, attempt)
    }

    /// Invokes the observer hook, if any.
    pub fn notify_retry(&self, err: &CallError, next_attempt: u32, delay: Duration) {
        if let Some(hook) = &self.on_retry {
            hook(err, next_attempt, delay);
        }
    }

    /// Returns the installed hook, if any.
    ///
    /// Used by the poller to chain its own event publishing onto a
    /// caller-supplied hook.
    pub fn hook(&self) -> Option<RetryHook> {
        self.on_retry.clone()
    }
}

impl Default for RetryPolicy {
    /// Same as [`RetryPolicy::transient`].
    fn default() -> Self {
        Self::transient()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("has_hook", &self.on_retry.is_some())
            .finish()
    }
}

/// Default classification: transient → retry, unknown → retry under cap,
/// everything else (permanent, canceled) → propagate.
fn default_predicate(err: &CallError, attempt: u32) -> bool {
    match err {
        CallError::Unknown { .. } => attempt < UNKNOWN_RETRY_CAP,
        _ => err.is_transient(),
    }
}
