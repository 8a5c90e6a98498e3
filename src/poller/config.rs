//! # Poller configuration.
//!
//! Provides [`PollerConfig`] — the per-poller settings bundle.
//!
//! ## Field semantics
//! - `interval`: cadence between status checks. Generation jobs take tens of
//!   seconds to minutes, so the default is a multi-second cadence, not
//!   sub-second.
//! - `max_ticks`: tick budget per session; hitting it ends the session as
//!   `Exhausted` (treated as a minimum of 1).
//! - `tick_retry`: optional transient-failure retry applied around each
//!   status check, so one flaky response does not kill a session.
//! - `bus_capacity`: ring-buffer size of the event bus a standalone poller
//!   creates for itself (min 1; clamped by `Bus`).

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Configuration for a [`Poller`](crate::Poller).
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between status checks, and before the first one.
    pub interval: Duration,

    /// Maximum number of still-pending ticks before the session ends as
    /// `Exhausted`.
    ///
    /// With the default interval this bounds a session to five minutes of
    /// polling.
    pub max_ticks: u32,

    /// Per-tick transient retry, applied around each status check.
    ///
    /// `None` means a single transient failure errors the session — appropriate
    /// when the caller's status endpoint is already fronted by its own retry.
    pub tick_retry: Option<RetryPolicy>,

    /// Capacity of the event bus created by `Poller::new`.
    ///
    /// Ignored when the poller is built with an externally shared bus.
    pub bus_capacity: usize,
}

impl Default for PollerConfig {
    /// Default configuration:
    ///
    /// - `interval = 5s` (human-latency job polling)
    /// - `max_ticks = 60`
    /// - `tick_retry = None`
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_ticks: 60,
            tick_retry: None,
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_multi_second() {
        let cfg = PollerConfig::default();
        assert!(cfg.interval >= Duration::from_secs(1));
        assert!(cfg.max_ticks > 0);
        assert!(cfg.tick_retry.is_none());
    }
}
