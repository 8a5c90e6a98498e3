//! # Metadata storage port.
//!
//! [`MetadataStore`] is the narrow seam to the relational store holding
//! [`AssetRecord`] rows. Implementations construct [`CallError`]s at this
//! boundary (constraint violations map naturally onto `Http`-style permanent
//! errors, connection loss onto `Network`).

use async_trait::async_trait;

use crate::error::CallError;
use crate::store::record::AssetRecord;

/// Row storage for committed asset metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts `record` into `table` and returns it as persisted.
    ///
    /// Backends that enrich rows on insert (defaulted columns, triggers)
    /// return the enriched record; others echo the input.
    async fn insert(&self, table: &str, record: AssetRecord) -> Result<AssetRecord, CallError>;
}
