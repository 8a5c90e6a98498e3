//! # jobwatch
//!
//! **jobwatch** is the resilience core for long-running generative-media
//! jobs: polling, retry with backoff, request coalescing, and transactional
//! artifact persistence.
//!
//! It is a library, not a service: route handlers own HTTP semantics and
//! provider adapters own wire formats; this crate owns the coordination in
//! between — when to ask again, when to give up, how to share one expensive
//! call among many callers, and how to make a finished artifact durable
//! without ever leaving a metadata row pointing at nothing.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ StatusProbe  │   │ StatusProbe  │   │ StatusProbe  │
//!     │ (job #1)     │   │ (job #2)     │   │ (job #3)     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Poller    │   │    Poller    │   │    Poller    │
//!     │ (tick loop)  │   │ (tick loop)  │   │ (tick loop)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Publishes        │ Publishes        │ Publishes
//!      │ Events:          │ Events:          │ Events:
//!      │ - TickStarting   │ - TickProgress   │ - RetryScheduled
//!      │ - PollCompleted  │ - PollExhausted  │ - PollFailed
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                       Bus (broadcast channel)                     │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          SubscriberSet::attach
//!                        (per-subscriber queues)
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                              sub1.on   sub2.on   subN.on
//!                               _event()  _event()  _event()
//!
//! Completion branch:
//!   PollHandle::join() ──► JobStatus { done, result } ──►
//!     TransactionalArtifactStore::commit(artifact, metadata)
//!       ├─► BlobStore::upload          (binary first — orphanable)
//!       ├─► MetadataStore::insert      (row second — never dangling)
//!       └─► BlobStore::delete          (compensation if insert fails)
//!
//! Anywhere an expensive identical lookup races:
//!   RequestCache::fetch(key, fetcher)  — one execution, shared outcome, TTL
//!
//! Anywhere a transient failure is survivable:
//!   retry_with_backoff(&policy, op)    — exponential delay, jitter, predicate
//! ```
//!
//! ### Poll session lifecycle
//! ```text
//! Poller::start()                       Idle/terminal ──► Polling
//!
//! loop {
//!   ├─► sleep(interval)                 (cancellable)
//!   ├─► probe.check(fresh child token)  (cancellable, optional tick retry)
//!   │       ├─ done      ─► Completed, resolve handle with status
//!   │       ├─ pending   ─► retry_count += 1; budget spent? ─► Exhausted
//!   │       ├─ Canceled  ─► swallowed   (never counted, never surfaced)
//!   │       └─ error     ─► Errored, resolve handle with the error
//!   └─ stop()/drop       ─► Stopped immediately; in-flight check aborted
//! }
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                      |
//! |-----------------|----------------------------------------------------------|-----------------------------------------|
//! | **Polling**     | Cadenced status checks with budget and cancellation.     | [`Poller`], [`StatusProbe`], [`ProbeFn`]|
//! | **Retry**       | Exponential backoff, jitter, pluggable classification.   | [`retry_with_backoff`], [`RetryPolicy`] |
//! | **Caching**     | TTL cache with request coalescing and FIFO eviction.     | [`RequestCache`], [`CachedFn`]          |
//! | **Persistence** | Upload-then-record commit with compensating rollback.    | [`TransactionalArtifactStore`]          |
//! | **Errors**      | Typed taxonomy constructed at the I/O boundary.          | [`CallError`], [`PollError`]            |
//! | **Events**      | Lifecycle observability over a broadcast bus.            | [`Event`], [`Bus`], [`Subscribe`]       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use jobwatch::{JobStatus, Poller, ProbeFn, RetryPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A probe that asks the provider for job status. Real adapters thread
//!     // the token into their HTTP client so stop() aborts the wire call.
//!     let probe = ProbeFn::arc("video-gen-42", |_ctx: CancellationToken| async {
//!         Ok(JobStatus::completed(vec![0u8; 4]))
//!     });
//!
//!     let poller = Poller::builder(probe)
//!         .interval(Duration::from_millis(10))
//!         .max_ticks(60)
//!         .tick_retry(RetryPolicy::transient())
//!         .build();
//!
//!     let status = poller.start()?.join().await?;
//!     assert!(status.done);
//!     Ok(())
//! }
//! ```

mod cache;
mod error;
mod events;
mod policies;
mod poller;
mod retry;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use cache::{CacheConfig, CacheEntry, CacheStats, CachedFn, EntryStats, RequestCache};
pub use error::{AlreadyPolling, CallError, CommitError, PollError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryHook, RetryPolicy, RetryPredicate, UNKNOWN_RETRY_CAP};
pub use poller::{
    JobStatus, PollHandle, PollSession, PollState, Poller, PollerBuilder, PollerConfig, ProbeFn,
    ProbeRef, StatusProbe, poll_until,
};
pub use retry::retry_with_backoff;
pub use store::{
    Artifact, AssetKind, AssetRecord, BlobStore, MetadataStore, TransactionalArtifactStore,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
