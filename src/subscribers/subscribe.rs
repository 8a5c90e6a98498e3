//! # Core subscriber trait.
//!
//! `Subscribe` is the extension point for plugging custom event handlers
//! (logging, metrics, websocket progress pushes) into the runtime. Each
//! subscriber is driven by a dedicated worker loop fed by a bounded queue
//! owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) — they never block the
//!   publisher nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative waits).
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use jobwatch::{Event, EventKind, Subscribe};
///
/// struct ProgressPush;
///
/// #[async_trait]
/// impl Subscribe for ProgressPush {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::TickProgress {
///             // push ev.progress to the browser...
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "progress-push"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
