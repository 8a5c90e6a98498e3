//! Poll-session events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by pollers and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: [`Poller`](crate::Poller) (tick lifecycle, terminal
//!   outcomes, per-tick retry scheduling), `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: anything holding a `Bus` handle — most commonly a
//!   [`SubscriberSet`](crate::SubscriberSet) attached via
//!   [`SubscriberSet::attach`](crate::SubscriberSet::attach).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
