//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [tick] job=video-gen-42 tick=3
//! [progress] job=video-gen-42 tick=3 pct=40
//! [retry] job=video-gen-42 attempt=1 delay_ms=500 err="http 503: unavailable"
//! [completed] job=video-gen-42 tick=4
//! [exhausted] job=video-gen-42 tick=60
//! [failed] job=video-gen-42 err="http 422: invalid job"
//! [stopped] job=video-gen-42
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TickStarting => {
                if let (Some(job), Some(tick)) = (&e.job, e.tick) {
                    println!("[tick] job={job} tick={tick}");
                }
            }
            EventKind::TickProgress => {
                println!(
                    "[progress] job={:?} tick={:?} pct={:?}",
                    e.job, e.tick, e.progress
                );
            }
            EventKind::TickScheduled => {
                println!(
                    "[scheduled] job={:?} tick={:?} delay_ms={:?}",
                    e.job, e.tick, e.delay_ms
                );
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry] job={:?} attempt={:?} delay_ms={:?} err={:?}",
                    e.job, e.attempt, e.delay_ms, e.reason
                );
            }
            EventKind::PollCompleted => {
                println!("[completed] job={:?} tick={:?}", e.job, e.tick);
            }
            EventKind::PollExhausted => {
                println!("[exhausted] job={:?} tick={:?}", e.job, e.tick);
            }
            EventKind::PollFailed => {
                println!("[failed] job={:?} err={:?}", e.job, e.reason);
            }
            EventKind::PollStopped => {
                println!("[stopped] job={:?}", e.job);
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                println!("[subscriber-fault] name={:?} reason={:?}", e.job, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
