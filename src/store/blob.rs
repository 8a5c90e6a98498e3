//! # Blob storage port.
//!
//! [`BlobStore`] is the narrow seam to whatever holds artifact binaries
//! (S3, Supabase storage, a local directory in tests). Implementations
//! construct [`CallError`]s at this boundary so callers can classify failures
//! without knowing the backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CallError;

/// Binary storage for generated artifacts.
///
/// All paths are backend-relative (e.g. `projects/42/clips/7.mp4`).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` to `path`, overwriting any existing object.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
        -> Result<(), CallError>;

    /// Deletes the object at `path`. Deleting a missing object is an error
    /// the caller may choose to ignore.
    async fn delete(&self, path: &str) -> Result<(), CallError>;

    /// Returns a time-limited download URL for `path`.
    ///
    /// Expensive on most backends; front it with a
    /// [`RequestCache`](crate::RequestCache) when many consumers race for the
    /// same path.
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String, CallError>;
}
