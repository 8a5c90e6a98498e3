//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for that
//!   subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::{Bus, Event};

use super::Subscribe;

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        warn!(subscriber = s.name(), ?panic_err, "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and a warning logged with the subscriber's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, "dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, "dropped event: worker closed");
                }
            }
        }
    }

    /// Subscribes to `bus` and forwards every event to this set until the
    /// bus is dropped. Returns the listener task handle.
    pub fn attach(self: Arc<Self>, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                self.emit(&ev);
            }
        })
    }

    /// Graceful shutdown: closes all queues and awaits worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::events::EventKind;

    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicker {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, Ordering::Relaxed);
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    #[tokio::test]
    async fn test_emit_fans_out_in_order() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let set = SubscriberSet::new(vec![recorder.clone()]);

        set.emit(&Event::now(EventKind::TickStarting));
        set.emit(&Event::now(EventKind::PollCompleted));
        set.shutdown().await;

        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            &[EventKind::TickStarting, EventKind::PollCompleted]
        );
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_kill_the_worker() {
        let panicker = Arc::new(Panicker {
            calls: AtomicU32::new(0),
        });
        let set = SubscriberSet::new(vec![panicker.clone()]);

        set.emit(&Event::now(EventKind::TickStarting));
        set.emit(&Event::now(EventKind::TickStarting));
        set.shutdown().await;

        // Both events were delivered despite the first panic.
        assert_eq!(panicker.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_attach_forwards_bus_events() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let set = Arc::new(SubscriberSet::new(vec![recorder.clone()]));
        let bus = Bus::new(16);
        let listener = Arc::clone(&set).attach(&bus);

        bus.publish(Event::now(EventKind::PollExhausted));
        drop(bus);
        let _ = listener.await;

        // The listener has exited and dropped its handle; drain the workers.
        match Arc::try_unwrap(set) {
            Ok(set) => set.shutdown().await,
            Err(_) => panic!("listener should have released the set"),
        }
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            &[EventKind::PollExhausted]
        );
    }
}
