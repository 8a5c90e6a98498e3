//! Polling engine: session state, configuration, probes, and the loop.
//!
//! This module contains the polling half of the crate. The public surface is
//! [`Poller`] (one instance per job) plus the types it is built from.
//!
//! Internal layout:
//! - [`status`]: the [`StatusProbe`] seam to provider adapters and the
//!   [`JobStatus`] envelope they map onto;
//! - [`session`]: the `Idle → Polling → terminal` state machine with
//!   epoch-guarded writes;
//! - [`config`]: per-poller settings;
//! - [`poller`]: the loop itself — cadence, fresh per-tick cancellation,
//!   optional transient retry, event publishing;
//! - [`simple`]: the one-call [`poll_until`] façade.

mod config;
mod poller;
mod session;
mod simple;
mod status;

pub use config::PollerConfig;
pub use poller::{PollHandle, Poller, PollerBuilder};
pub use session::{PollSession, PollState};
pub use simple::poll_until;
pub use status::{JobStatus, ProbeFn, ProbeRef, StatusProbe};
