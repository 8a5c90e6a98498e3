//! Event subscribers: the fan-out layer over the bus.
//!
//! ## Architecture
//! ```text
//! Poller ── publish(Event) ──► Bus ──► SubscriberSet::attach listener
//!                                          │
//!                                     ┌────┴────┬─────────┐
//!                                     ▼         ▼         ▼
//!                                 [queue S1] [queue S2] [queue SN]
//!                                     ▼         ▼         ▼
//!                                 worker S1 worker S2 worker SN
//!                                     ▼         ▼         ▼
//!                              sub.on_event(&Event)  (per subscriber)
//! ```
//!
//! ## Contents
//! - [`Subscribe`] — the handler contract
//! - [`SubscriberSet`] — bounded per-subscriber queues, panic isolation
//! - `LogWriter` — stdout demo subscriber (feature `logging`)

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
