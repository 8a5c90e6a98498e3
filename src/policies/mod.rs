//! Retry and backoff policies.
//!
//! This module groups the knobs that control **whether** a failed call is
//! retried and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RetryPolicy`] which errors to retry, how many times, with what hook
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! retry_with_backoff(&policy, op)
//!      └─► policy.should_retry(err, attempt)   decide
//!      └─► policy.backoff.next(attempt)        delay
//!      └─► policy.notify_retry(err, n, delay)  observe (before sleep)
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::transient()` — 3 retries, exponential from 500ms capped at
//!   10s, additive jitter.
//! - `BackoffPolicy::default()` — first=500ms, factor=2.0, max=30s, no jitter.
//! - `JitterPolicy::None` by default; `Additive` for callers sharing a
//!   provider.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{RetryHook, RetryPolicy, RetryPredicate, UNKNOWN_RETRY_CAP};
