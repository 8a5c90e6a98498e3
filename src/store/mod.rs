//! Artifact persistence: storage ports, data model, and the commit.
//!
//! ## Contents
//! - [`BlobStore`], [`MetadataStore`] narrow ports to the binary and
//!   relational backends
//! - [`Artifact`], [`AssetRecord`], [`AssetKind`] the data model either side
//!   of the commit
//! - [`TransactionalArtifactStore`] the upload-then-record commit with
//!   compensating rollback
//!
//! ## Quick reference
//! The completion branch of a poll session hands its binary output here;
//! nothing is durable until [`TransactionalArtifactStore::commit`] returns
//! `Ok`.

mod blob;
mod metadata;
mod record;
mod transactional;

pub use blob::BlobStore;
pub use metadata::MetadataStore;
pub use record::{Artifact, AssetKind, AssetRecord};
pub use transactional::TransactionalArtifactStore;
