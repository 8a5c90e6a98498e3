//! # Status probes: the operation a poll session repeats.
//!
//! This module defines the [`StatusProbe`] trait (async, cancelable) and a
//! convenient function-backed implementation [`ProbeFn`]. The common handle
//! type is [`ProbeRef`], an `Arc<dyn StatusProbe>` suitable for sharing with
//! a running session.
//!
//! A probe receives a [`CancellationToken`] scoped to the single tick that
//! invoked it and should thread it into its network call so that stopping the
//! session can abort the call in flight, not merely ignore its result.
//!
//! The [`JobStatus`] shape is the contract every provider adapter maps onto:
//! whatever the provider's wire format looks like, the poller only ever reads
//! `done`, and passes the rest through to the caller untouched.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::CallError;

/// Provider-reported status of a long-running job.
///
/// Providers differ in everything except this envelope: a completion flag,
/// an optional output, an optional provider-side error message, and optional
/// progress. The poller treats the contents as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus<T> {
    /// True once the provider considers the job finished (successfully or
    /// not — see `error`).
    pub done: bool,
    /// Job output, if the provider returns one on completion.
    pub result: Option<T>,
    /// Provider-side failure description, if the job finished unsuccessfully.
    pub error: Option<String>,
    /// Provider-reported progress, 0–100.
    pub progress_percent: Option<f32>,
}

impl<T> JobStatus<T> {
    /// A still-running status with optional progress.
    pub fn pending(progress_percent: Option<f32>) -> Self {
        Self {
            done: false,
            result: None,
            error: None,
            progress_percent,
        }
    }

    /// A completed status carrying output.
    pub fn completed(result: T) -> Self {
        Self {
            done: true,
            result: Some(result),
            error: None,
            progress_percent: Some(100.0),
        }
    }

    /// A completed status carrying a provider-side failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            done: true,
            result: None,
            error: Some(error.into()),
            progress_percent: None,
        }
    }
}

/// # Asynchronous, cancelable status check for one job.
///
/// A `StatusProbe` has a stable [`job_id`](StatusProbe::job_id) and an async
/// [`check`](StatusProbe::check) that receives a per-tick
/// [`CancellationToken`]. Implementations should pass the token to their
/// HTTP client (or poll it) so an aborted tick stops the wire call promptly.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use jobwatch::{CallError, JobStatus, StatusProbe};
///
/// struct RenderJob;
///
/// #[async_trait]
/// impl StatusProbe for RenderJob {
///     type Output = Vec<u8>;
///
///     fn job_id(&self) -> &str { "render-42" }
///
///     async fn check(&self, ctx: CancellationToken) -> Result<JobStatus<Vec<u8>>, CallError> {
///         if ctx.is_cancelled() {
///             return Err(CallError::Canceled);
///         }
///         // ask the provider...
///         Ok(JobStatus::pending(Some(40.0)))
///     }
/// }
/// ```
#[async_trait]
pub trait StatusProbe: Send + Sync + 'static {
    /// The job's output type (binary content, a URL, a provider payload...).
    type Output: Send + 'static;

    /// Returns a stable, human-readable job identifier.
    fn job_id(&self) -> &str;

    /// Performs one status check.
    ///
    /// `ctx` is cancelled when the session is stopped while this check is in
    /// flight; well-behaved implementations return [`CallError::Canceled`]
    /// promptly in that case.
    async fn check(&self, ctx: CancellationToken) -> Result<JobStatus<Self::Output>, CallError>;
}

/// Shared handle to a status probe.
pub type ProbeRef<T> = Arc<dyn StatusProbe<Output = T>>;

/// Function-backed status probe.
///
/// Wraps a closure that *creates* a new future per check, so there is no
/// shared mutable state between ticks; share state explicitly via `Arc`
/// inside the closure if you need it.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use jobwatch::{CallError, JobStatus, ProbeFn, StatusProbe};
///
/// let probe = ProbeFn::new("upscale-7", |_ctx: CancellationToken| async {
///     Ok::<_, CallError>(JobStatus::<String>::pending(None))
/// });
/// assert_eq!(probe.job_id(), "upscale-7");
/// ```
pub struct ProbeFn<F, T> {
    job_id: Cow<'static, str>,
    f: F,
    _out: PhantomData<fn() -> T>,
}

impl<F, T> ProbeFn<F, T> {
    /// Creates a new function-backed probe.
    ///
    /// Prefer [`ProbeFn::arc`] when you immediately need a [`ProbeRef`].
    pub fn new(job_id: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            job_id: job_id.into(),
            f,
            _out: PhantomData,
        }
    }

    /// Creates the probe and returns it as a shared handle.
    pub fn arc(job_id: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(job_id, f))
    }
}

#[async_trait]
impl<F, Fut, T> StatusProbe for ProbeFn<F, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<JobStatus<T>, CallError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn job_id(&self) -> &str {
        &self.job_id
    }

    async fn check(&self, ctx: CancellationToken) -> Result<JobStatus<T>, CallError> {
        (self.f)(ctx).await
    }
}
