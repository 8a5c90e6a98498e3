//! # Retry a fallible async operation with backoff.
//!
//! [`retry_with_backoff`] re-invokes an operation until it succeeds, the
//! policy refuses the error, or the retry budget is spent.
//!
//! ## Flow
//! ```text
//! attempt 0 ──► op() ── Ok ──────────────────────────► return value
//!                 │
//!                 └─ Err ──► attempt == max_retries? ─► return last error
//!                            !should_retry(err, n)?  ─► return last error
//!                                 │
//!                                 ├─► delay = backoff.next(n)
//!                                 ├─► on_retry(err, n+1, delay)   (before sleep)
//!                                 ├─► sleep(delay)
//!                                 └─► attempt n+1
//! ```
//!
//! ## Rules
//! - Attempt 0 runs immediately, unguarded by any delay.
//! - The error propagated after exhaustion is the **last** one encountered.
//! - The hook fires **before** the sleep, so the decision is observable even
//!   if the process is interrupted mid-wait.
//! - Cancellation composes by dropping: the returned future holds no locks,
//!   so a caller racing it against a cancellation token simply drops it,
//!   which also aborts any pending backoff sleep.

use std::future::Future;

use tokio::time;

use crate::error::CallError;
use crate::policies::RetryPolicy;

/// Runs `op` until it succeeds or the policy gives up.
///
/// `op` is a zero-argument closure producing a fresh future per attempt.
///
/// # Example
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use jobwatch::{retry_with_backoff, BackoffPolicy, CallError, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// static CALLS: AtomicU32 = AtomicU32::new(0);
///
/// let policy = RetryPolicy::new(2, BackoffPolicy {
///     first: std::time::Duration::from_millis(1),
///     ..BackoffPolicy::default()
/// });
/// let out = retry_with_backoff(&policy, || async {
///     match CALLS.fetch_add(1, Ordering::Relaxed) {
///         0 | 1 => Err(CallError::http(503, "warming up")),
///         _ => Ok(42),
///     }
/// })
/// .await;
///
/// assert_eq!(out.unwrap(), 42);
/// assert_eq!(CALLS.load(Ordering::Relaxed), 3);
/// # }
/// ```
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries || !policy.should_retry(&err, attempt) {
                    return Err(err);
                }
                let delay = policy.backoff.next(attempt);
                policy.notify_retry(&err, attempt + 1, delay);
                time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
