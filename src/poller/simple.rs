//! # One-call polling for the simple case.
//!
//! [`poll_until`] reduces the completion predicate to a single
//! `bool`-returning async function and uses the default cadence — a thin
//! façade over the same [`Poller`](crate::Poller), not a separate engine.
//!
//! Use it for fire-and-forget waits where nothing about the session needs to
//! be observed or controlled; anything fancier (stop, reset, events, per-tick
//! retry) wants a real `Poller`.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{CallError, PollError};
use crate::poller::config::PollerConfig;
use crate::poller::poller::Poller;
use crate::poller::status::{JobStatus, ProbeFn};

/// Polls `is_done` on the default cadence until it returns true.
///
/// `is_done` is invoked once per tick; returning `Ok(true)` completes the
/// wait. Errors propagate with the usual classification (a transient failure
/// is not retried here — wrap the closure in
/// [`retry_with_backoff`](crate::retry_with_backoff) or use a configured
/// [`Poller`](crate::Poller) if you need that).
///
/// # Example
/// ```no_run
/// use jobwatch::{poll_until, CallError};
///
/// # async fn check_provider() -> Result<bool, CallError> { Ok(true) }
/// # async fn demo() -> Result<(), jobwatch::PollError> {
/// poll_until("thumbnail-17", || check_provider()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<F, Fut>(job_id: &str, is_done: F) -> Result<(), PollError>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, CallError>> + Send + 'static,
{
    let probe = ProbeFn::arc(job_id.to_owned(), move |_ctx: CancellationToken| {
        let fut = is_done();
        async move {
            let done = fut.await?;
            Ok(JobStatus::<()> {
                done,
                result: None,
                error: None,
                progress_percent: None,
            })
        }
    });
    let poller = Poller::new(probe, PollerConfig::default());
    // A freshly built poller has no active session, so start cannot be busy.
    let Ok(handle) = poller.start() else {
        return Err(PollError::Stopped);
    };
    handle.join().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_completes() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        poll_until("simple-job", move || {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            async move { Ok(n >= 2) }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_propagates_errors() {
        let out = poll_until("broken-job", || async {
            Err::<bool, _>(CallError::http(401, "expired token"))
        })
        .await;
        assert!(matches!(out.unwrap_err(), PollError::Check { .. }));
    }
}
