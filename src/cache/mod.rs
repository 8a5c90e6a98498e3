//! Request cache: TTL entries, FIFO eviction, in-flight de-duplication.
//!
//! ## Contents
//! - [`RequestCache`] the keyed cache and coalescer
//! - [`CacheConfig`], [`CacheStats`], [`EntryStats`] configuration and
//!   observability types
//! - [`CachedFn`] adapter caching an arbitrary async function by derived key
//!
//! ## Quick reference
//! Callers racing for the same expensive lookup (a signed-download-URL, a
//! provider capability probe) share one underlying fetch and its outcome;
//! results live for a TTL and are evicted oldest-inserted-first.

mod cache;
mod entry;
mod keyed;

pub use cache::{CacheConfig, CacheStats, EntryStats, RequestCache};
pub use entry::CacheEntry;
pub use keyed::CachedFn;
