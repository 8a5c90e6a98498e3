//! # Poll-session state with epoch-based stale-write rejection.
//!
//! [`PollSession`] is the externally visible state of one polling run:
//! whether it is active, how many ticks it has consumed, and the last
//! non-cancellation error seen. It is owned by the [`Poller`](crate::Poller)
//! and mutated only through [`SessionCell`].
//!
//! ## Why epochs
//! `stop()` transitions the session to `Stopped` immediately, while the loop
//! task unwinds asynchronously; the caller may `start()` a fresh session
//! before the old loop has fully finished. Every loop-side write carries the
//! epoch the loop was started with, and writes from a stale epoch are
//! rejected:
//! ```text
//! begin()            → epoch=1, Polling
//! stop()             → Stopped (epoch still 1)
//! begin()            → epoch=2, Polling        (fresh session)
//! old loop finishes  → write with epoch=1      → rejected (stale)
//! ```
//!
//! ## Invariants
//! - `retry_count` only increments while the state is `Polling`.
//! - `is_polling()` is false in every terminal state.

use std::sync::Mutex;

use crate::error::CallError;

/// State machine of one polling run.
///
/// `Idle → Polling → {Completed, Exhausted, Errored, Stopped}`; the four
/// right-hand states are terminal for that session. Starting again from a
/// terminal state begins a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// No session has run yet (or the poller was reset).
    #[default]
    Idle,
    /// A session is active: a timer is pending or a tick is in flight.
    Polling,
    /// The job reported completion.
    Completed,
    /// The tick budget was spent without completion.
    Exhausted,
    /// A status check failed with a non-cancellation error.
    Errored,
    /// The caller stopped the session.
    Stopped,
}

impl PollState {
    /// True for states that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed | PollState::Exhausted | PollState::Errored | PollState::Stopped
        )
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Polling => "polling",
            PollState::Completed => "completed",
            PollState::Exhausted => "exhausted",
            PollState::Errored => "errored",
            PollState::Stopped => "stopped",
        }
    }
}

/// Snapshot of a poll session's externally visible state.
#[derive(Debug, Clone, Default)]
pub struct PollSession {
    /// Current state.
    pub state: PollState,
    /// Ticks consumed by the current session.
    pub retry_count: u32,
    /// Last non-cancellation error seen by the current session.
    pub last_error: Option<CallError>,
}

impl PollSession {
    /// True while a session is active.
    pub fn is_polling(&self) -> bool {
        self.state == PollState::Polling
    }
}

/// Epoch-guarded owner of the session state.
///
/// All mutation goes through here. Caller-side operations (`begin`, `stop`,
/// `reset`) bump or respect the epoch; loop-side operations carry the epoch
/// they were started with and are dropped if it is stale.
#[derive(Debug, Default)]
pub(crate) struct SessionCell {
    inner: Mutex<Guarded>,
}

#[derive(Debug, Default)]
struct Guarded {
    epoch: u64,
    session: PollSession,
}

impl SessionCell {
    /// Starts a fresh session: bumps the epoch, clears counters and the last
    /// error, and enters `Polling`. Returns the new epoch.
    ///
    /// Fails (returns `None`) if a session is already active.
    pub fn begin(&self) -> Option<u64> {
        let mut g = self.inner.lock().unwrap();
        if g.session.state == PollState::Polling {
            return None;
        }
        g.epoch += 1;
        g.session = PollSession {
            state: PollState::Polling,
            retry_count: 0,
            last_error: None,
        };
        Some(g.epoch)
    }

    /// Caller-side stop: transitions to `Stopped` immediately if the session
    /// is active. Idempotent; returns true only on the transition.
    pub fn stop(&self) -> bool {
        let mut g = self.inner.lock().unwrap();
        if g.session.state == PollState::Polling {
            g.session.state = PollState::Stopped;
            true
        } else {
            false
        }
    }

    /// Clears counters and the last error and returns to `Idle`.
    ///
    /// Bumps the epoch so any still-unwinding loop becomes stale.
    pub fn reset(&self) {
        let mut g = self.inner.lock().unwrap();
        g.epoch += 1;
        g.session = PollSession::default();
    }

    /// Loop-side: increments the tick counter. Stale or non-polling writes
    /// are rejected. Returns the new count on success.
    pub fn record_tick(&self, epoch: u64) -> Option<u32> {
        let mut g = self.inner.lock().unwrap();
        if g.epoch != epoch || g.session.state != PollState::Polling {
            return None;
        }
        g.session.retry_count += 1;
        Some(g.session.retry_count)
    }

    /// Loop-side: moves the session into a terminal state, optionally
    /// recording a final error. Stale writes and writes over an
    /// already-terminal state are rejected.
    pub fn finish(&self, epoch: u64, state: PollState, error: Option<CallError>) -> bool {
        debug_assert!(state.is_terminal());
        let mut g = self.inner.lock().unwrap();
        if g.epoch != epoch || g.session.state != PollState::Polling {
            return false;
        }
        g.session.state = state;
        if error.is_some() {
            g.session.last_error = error;
        }
        true
    }

    /// Snapshot of the current session.
    pub fn snapshot(&self) -> PollSession {
        self.inner.lock().unwrap().session.clone()
    }
}
