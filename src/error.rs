//! Error types used across the jobwatch core.
//!
//! This module defines three error enums, one per failure domain:
//!
//! - [`CallError`] — errors raised by individual I/O calls (status checks,
//!   blob uploads, metadata inserts, cache fetchers).
//! - [`PollError`] — terminal outcomes of a poll session that are not
//!   completion.
//! - [`CommitError`] — failures of the upload-then-record commit.
//!
//! All types provide `as_label` for logging/metrics, and [`CallError`]
//! additionally carries the retry classification (`is_transient`,
//! `is_permanent`, `is_canceled`) consulted by the default retry predicate.
//!
//! ## Classification
//! ```text
//! CallError
//! ├── Transient (retryable)
//! │   ├── Network          - transport-layer failure
//! │   ├── Timeout          - call exceeded its deadline
//! │   └── Http 5xx / 429   - server fault or rate limit
//! ├── Permanent (not retryable)
//! │   └── Http 4xx (≠429)  - the request itself is wrong
//! ├── Canceled             - caller-initiated abort, never surfaced as failure
//! └── Unknown              - unclassified; retried only under a small cap
//! ```

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by a single I/O call.
///
/// Constructed at the I/O boundary by the collaborator implementations
/// (status probes, blob stores, metadata stores, cache fetchers), so the rest
/// of the core never inspects untyped error shapes.
///
/// `Clone` is deliberate: the same error instance is shared with every cache
/// caller that joined an in-flight fetch, and kept as `last_error` in a poll
/// session.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Transport-layer failure (DNS, connect, reset, TLS).
    #[error("network error: {reason}")]
    Network {
        /// The underlying transport error message.
        reason: String,
    },

    /// The remote answered with a non-success HTTP status.
    #[error("http {status}: {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response detail, if any.
        reason: String,
    },

    /// The call exceeded its deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The call was aborted by its caller (stop, teardown, dropped future).
    #[error("call canceled")]
    Canceled,

    /// An error of unknown shape, normalized at the boundary.
    #[error("{reason}")]
    Unknown {
        /// Whatever detail was available.
        reason: String,
    },
}

impl CallError {
    /// Creates a [`CallError::Network`].
    pub fn network(reason: impl Into<String>) -> Self {
        CallError::Network {
            reason: reason.into(),
        }
    }

    /// Creates a [`CallError::Http`].
    pub fn http(status: u16, reason: impl Into<String>) -> Self {
        CallError::Http {
            status,
            reason: reason.into(),
        }
    }

    /// Creates a [`CallError::Unknown`].
    pub fn unknown(reason: impl Into<String>) -> Self {
        CallError::Unknown {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobwatch::CallError;
    ///
    /// assert_eq!(CallError::http(503, "unavailable").as_label(), "call_http");
    /// assert_eq!(CallError::Canceled.as_label(), "call_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Network { .. } => "call_network",
            CallError::Http { .. } => "call_http",
            CallError::Timeout { .. } => "call_timeout",
            CallError::Canceled => "call_canceled",
            CallError::Unknown { .. } => "call_unknown",
        }
    }

    /// True for failures that are worth retrying: transport errors, timeouts,
    /// server faults (5xx) and rate limits (429).
    ///
    /// # Example
    /// ```
    /// use jobwatch::CallError;
    ///
    /// assert!(CallError::http(429, "slow down").is_transient());
    /// assert!(CallError::http(502, "bad gateway").is_transient());
    /// assert!(!CallError::http(404, "gone").is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            CallError::Network { .. } | CallError::Timeout { .. } => true,
            CallError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// True for client-side failures that retrying cannot fix (4xx except 429).
    pub fn is_permanent(&self) -> bool {
        matches!(self, CallError::Http { status, .. } if (400..500).contains(status) && *status != 429)
    }

    /// True if the call was aborted by its caller.
    ///
    /// Cancellation is absorbed silently by the poller and the retrier; it is
    /// never reported as a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, CallError::Canceled)
    }
}

/// # Terminal poll-session outcomes other than completion.
///
/// Exhaustion is deliberately distinct from the last transient error seen
/// while polling: hitting the tick budget is a timeout-flavored condition of
/// the session, not a property of any single status check.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The tick budget was spent without the job completing.
    #[error("poll budget exhausted after {ticks} ticks")]
    Exhausted {
        /// Number of ticks consumed.
        ticks: u32,
    },

    /// Polling was stopped by the caller before completion.
    #[error("polling stopped before completion")]
    Stopped,

    /// A status check failed with a non-cancellation error.
    #[error("status check failed: {source}")]
    Check {
        /// The underlying call failure.
        #[source]
        source: CallError,
    },
}

impl PollError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Exhausted { .. } => "poll_exhausted",
            PollError::Stopped => "poll_stopped",
            PollError::Check { .. } => "poll_check_failed",
        }
    }
}

impl From<CallError> for PollError {
    fn from(source: CallError) -> Self {
        PollError::Check { source }
    }
}

/// # Failures of the upload-then-record artifact commit.
///
/// Both variants carry the storage path and the primary [`CallError`].
/// Compensation failures are logged by the store, never encoded here: the
/// primary error is what the caller acts on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommitError {
    /// The blob upload failed; nothing was persisted.
    #[error("upload to {path} failed: {source}")]
    Upload {
        /// Storage path the upload targeted.
        path: String,
        /// The underlying storage error.
        #[source]
        source: CallError,
    },

    /// The metadata insert failed after a successful upload.
    ///
    /// The uploaded blob has been deleted on a best-effort basis; if that
    /// compensating delete also failed, the blob is orphaned (logged, and
    /// cleanable later — never surfaced to the caller in place of this error).
    #[error("metadata insert for {path} failed: {source}")]
    Insert {
        /// Storage path of the already-uploaded blob.
        path: String,
        /// The underlying insert error.
        #[source]
        source: CallError,
    },
}

impl CommitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommitError::Upload { .. } => "commit_upload_failed",
            CommitError::Insert { .. } => "commit_insert_failed",
        }
    }

    /// The storage path involved in the failed commit.
    pub fn path(&self) -> &str {
        match self {
            CommitError::Upload { path, .. } | CommitError::Insert { path, .. } => path,
        }
    }
}

/// Returned by [`Poller::start`](crate::Poller::start) when a session is
/// already running. Stop or let it finish before starting a fresh session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("poller is already running")]
pub struct AlreadyPolling;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_5xx_and_429_are_transient() {
        assert!(CallError::http(500, "boom").is_transient());
        assert!(CallError::http(503, "unavailable").is_transient());
        assert!(CallError::http(429, "rate limited").is_transient());
        assert!(CallError::network("reset").is_transient());
        assert!(CallError::Timeout {
            timeout: Duration::from_secs(5)
        }
        .is_transient());
    }

    #[test]
    fn test_4xx_except_429_is_permanent() {
        assert!(CallError::http(400, "bad request").is_permanent());
        assert!(CallError::http(404, "not found").is_permanent());
        assert!(!CallError::http(429, "rate limited").is_permanent());
        assert!(!CallError::http(500, "boom").is_permanent());
    }

    #[test]
    fn test_canceled_is_neither_transient_nor_permanent() {
        let err = CallError::Canceled;
        assert!(err.is_canceled());
        assert!(!err.is_transient());
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(CallError::network("x").as_label(), "call_network");
        assert_eq!(
            PollError::Exhausted { ticks: 3 }.as_label(),
            "poll_exhausted"
        );
        assert_eq!(
            CommitError::Insert {
                path: "a/b".into(),
                source: CallError::http(500, "boom"),
            }
            .as_label(),
            "commit_insert_failed"
        );
    }

    #[test]
    fn test_exhaustion_is_not_the_last_call_error() {
        // Exhaustion carries the tick count, not whatever error happened last.
        let err = PollError::Exhausted { ticks: 40 };
        assert_eq!(err.to_string(), "poll budget exhausted after 40 ticks");
    }
}
