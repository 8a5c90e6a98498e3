//! # Upload-then-record commit with compensating rollback.
//!
//! [`TransactionalArtifactStore`] makes a finished artifact durable in two
//! steps whose ordering is the whole point:
//!
//! ```text
//! commit(artifact, metadata)
//!   ├─► 1. blob.upload(path, bytes)      ── Err ─► CommitError::Upload
//!   ├─► 2. metadata.insert(table, row)   ── Ok ──► AssetRecord
//!   └─► 2 failed:
//!         ├─► blob.delete(path)          (compensating action, best-effort)
//!         │     └─ Err ─► warn! and move on (orphaned blob, cleanable later)
//!         └─► CommitError::Insert        (the primary error, always)
//! ```
//!
//! Failure semantics are asymmetric by design: a stray blob without a row is
//! a storage-cost leak; a row pointing at a missing blob would surface to end
//! users as a broken asset. Uploading first guarantees the second case cannot
//! happen.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CommitError;
use crate::store::blob::BlobStore;
use crate::store::metadata::MetadataStore;
use crate::store::record::{Artifact, AssetRecord};

/// Default table committed records land in.
const DEFAULT_TABLE: &str = "assets";

/// Durably persists generated artifacts: upload the binary, then record it.
///
/// One store instance is typically shared by every job's completion branch;
/// it is stateless apart from its two ports.
pub struct TransactionalArtifactStore {
    blob: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    table: String,
}

impl TransactionalArtifactStore {
    /// Creates a store committing into the default `assets` table.
    pub fn new(blob: Arc<dyn BlobStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self::with_table(blob, metadata, DEFAULT_TABLE)
    }

    /// Creates a store committing into a specific table.
    pub fn with_table(
        blob: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            blob,
            metadata,
            table: table.into(),
        }
    }

    /// Commits `artifact`: upload, then insert, rolling back the upload if
    /// the insert fails.
    ///
    /// `extra` is caller metadata stored on the record; `owner_id` and
    /// `project_id` from the artifact are folded into it. The artifact is not
    /// durable until this returns `Ok`.
    ///
    /// ### Failure semantics
    /// - Upload failure: nothing was persisted, [`CommitError::Upload`].
    /// - Insert failure: the uploaded blob is deleted best-effort, then
    ///   [`CommitError::Insert`] carrying the insert error — never the
    ///   compensation outcome — is returned.
    pub async fn commit(
        &self,
        artifact: Artifact,
        extra: Value,
    ) -> Result<AssetRecord, CommitError> {
        let path = artifact.storage_path.clone();

        self.blob
            .upload(&path, &artifact.bytes, &artifact.content_type)
            .await
            .map_err(|source| CommitError::Upload {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path, kind = artifact.kind.as_label(), bytes = artifact.bytes.len(), "artifact uploaded");

        let record = AssetRecord {
            id: Uuid::now_v7(),
            storage_path: path.clone(),
            kind: artifact.kind,
            metadata: fold_ownership(extra, &artifact),
            created_at: Utc::now(),
        };

        match self.metadata.insert(&self.table, record).await {
            Ok(persisted) => {
                debug!(path = %path, id = %persisted.id, "artifact committed");
                Ok(persisted)
            }
            Err(source) => {
                if let Err(cleanup) = self.blob.delete(&path).await {
                    // Subordinate failure: the blob is orphaned, which we
                    // accept over masking the insert error.
                    warn!(path = %path, error = %cleanup, "compensating delete failed; blob orphaned");
                }
                Err(CommitError::Insert { path, source })
            }
        }
    }
}

/// Folds the artifact's ownership fields into the caller's metadata object.
fn fold_ownership(extra: Value, artifact: &Artifact) -> Value {
    let mut metadata = match extra {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_owned(), other);
            map
        }
    };
    metadata.insert("owner_id".to_owned(), Value::from(artifact.owner_id.clone()));
    metadata.insert(
        "project_id".to_owned(),
        Value::from(artifact.project_id.clone()),
    );
    Value::Object(metadata)
}
