//! # Artifact and asset-record data model.
//!
//! An [`Artifact`] is a finished generation output still in memory; an
//! [`AssetRecord`] is its durable metadata row. The two are linked by
//! `storage_path`, and only
//! [`TransactionalArtifactStore::commit`](crate::TransactionalArtifactStore::commit)
//! turns the former into the latter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Media type of a generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Generated or edited video.
    Video,
    /// Generated or edited image / frame.
    Image,
    /// Synthesized audio.
    Audio,
}

impl AssetKind {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
        }
    }
}

/// A finished generation output, not yet durable.
///
/// Exists only in memory between job completion and commit. The binary is
/// orphanable: it may land in blob storage without a metadata row (a
/// tolerable, cleanable leak), but never the other way around.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The binary content.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. `video/mp4`).
    pub content_type: String,
    /// Destination path in blob storage.
    pub storage_path: String,
    /// Owning user.
    pub owner_id: String,
    /// Owning project.
    pub project_id: String,
    /// Media type.
    pub kind: AssetKind,
}

/// Durable metadata row describing a committed asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Time-ordered unique id (uuid v7).
    pub id: Uuid,
    /// Path of the committed binary in blob storage.
    pub storage_path: String,
    /// Media type.
    pub kind: AssetKind,
    /// Caller-supplied metadata, plus `owner_id`/`project_id` folded in at
    /// commit time.
    pub metadata: Value,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}
