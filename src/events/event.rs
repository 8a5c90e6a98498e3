//! # Lifecycle events emitted by poll sessions.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Tick events**: the per-tick flow (starting, progress, next tick
//!   scheduled, transient retry scheduled)
//! - **Terminal events**: session outcomes (completed, exhausted, failed,
//!   stopped)
//! - **Subscriber events**: delivery faults in the fan-out layer itself
//!
//! The [`Event`] struct carries optional metadata: job id, tick number,
//! retry attempt, delay, provider-reported progress, and a reason string.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use jobwatch::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TickStarting)
//!     .with_job("video-gen-42")
//!     .with_tick(3);
//!
//! assert_eq!(ev.kind, EventKind::TickStarting);
//! assert_eq!(ev.job.as_deref(), Some("video-gen-42"));
//! assert_eq!(ev.tick, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of poll-session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Tick events ===
    /// A status check is starting.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: tick number (1-based, per session)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TickStarting,

    /// A status check resolved without completion and reported progress.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: tick number
    /// - `progress`: provider-reported percentage
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TickProgress,

    /// The next tick has been scheduled.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: tick number just finished
    /// - `delay_ms`: polling interval until the next tick
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TickScheduled,

    /// A transient per-tick failure triggered a retry with backoff.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `attempt`: retry attempt about to run (1-based, within one tick)
    /// - `delay_ms`: backoff delay before that attempt
    /// - `reason`: the transient failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RetryScheduled,

    // === Terminal events ===
    /// The job reported completion.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: tick that observed completion
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PollCompleted,

    /// The tick budget was spent without completion.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: last tick number
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PollExhausted,

    /// A status check failed with a non-cancellation error.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `tick`: tick that failed
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PollFailed,

    /// The session was stopped by the caller.
    ///
    /// Sets:
    /// - `job`: job identifier
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PollStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `job`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `job`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,
}

/// Poll-session event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Job identifier (or subscriber name for subscriber events).
    pub job: Option<Arc<str>>,
    /// Tick count within the session (starting from 1).
    pub tick: Option<u32>,
    /// Retry attempt within one tick (starting from 1).
    pub attempt: Option<u32>,
    /// Delay until the next tick or retry attempt, in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Provider-reported progress percentage.
    pub progress: Option<f32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            tick: None,
            attempt: None,
            delay_ms: None,
            progress: None,
            reason: None,
        }
    }

    /// Attaches a job identifier.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a tick number.
    #[inline]
    pub fn with_tick(mut self, tick: u32) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attaches a retry attempt number.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a progress percentage.
    #[inline]
    pub fn with_progress(mut self, pct: f32) -> Self {
        self.progress = Some(pct);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_job(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_job(subscriber)
            .with_reason(info)
    }

    /// True if this event marks a terminal session state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::PollCompleted
                | EventKind::PollExhausted
                | EventKind::PollFailed
                | EventKind::PollStopped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::TickStarting);
        let b = Event::now(EventKind::TickStarting);
        let c = Event::now(EventKind::PollCompleted);
        assert!(a.seq < b.seq);
        assert!(b.seq < c.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::now(EventKind::RetryScheduled)
            .with_job("job-1")
            .with_attempt(2)
            .with_delay(Duration::from_millis(1500))
            .with_reason("http 503: unavailable");
        assert_eq!(ev.job.as_deref(), Some("job-1"));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(1500));
        assert_eq!(ev.reason.as_deref(), Some("http 503: unavailable"));
    }

    #[test]
    fn test_terminal_classification() {
        assert!(Event::now(EventKind::PollStopped).is_terminal());
        assert!(Event::now(EventKind::PollExhausted).is_terminal());
        assert!(!Event::now(EventKind::TickStarting).is_terminal());
    }
}
