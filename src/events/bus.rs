//! # Event bus for broadcasting poll-session events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (pollers, the retrier
//! hook chain) to any number of listeners.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or awaits.
//! - **Bounded capacity**: a single ring buffer stores recent events for all
//!   receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip the
//!   `n` oldest items.
//! - **No persistence**: events are dropped if nobody is subscribed at send
//!   time. Observability never gates control flow.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for poll-session events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); one bus is
/// typically shared by every poller a caller creates, with the job id on each
/// event telling sessions apart.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to ≥ 1).
    ///
    /// Capacity is **shared** across all receivers, not per-subscriber; a
    /// receiver that falls more than `capacity` events behind observes
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver observing subsequent events.
    ///
    /// Each call creates an **independent** receiver that only sees events
    /// sent after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    /// A bus with the default capacity of 256 events.
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_then_receive() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::now(EventKind::TickStarting).with_job("j"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TickStarting);
        assert_eq!(ev.job.as_deref(), Some("j"));
    }

    #[tokio::test]
    async fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(8);
        // No subscriber; must not panic or block.
        bus.publish(Event::now(EventKind::PollStopped));
    }
}
