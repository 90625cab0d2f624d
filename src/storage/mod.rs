//! Blob storage abstractions.
//!
//! Every durable object — the checkpoint, the exclusion list, the raw
//! post log and every rendered artifact — goes through [`BlobStorage`].
//! Keys are `/`-separated paths relative to the store root.
//!
//! ## Key-space layout
//!
//! ```text
//! settings/
//! ├── latest_post_id            # Checkpoint cursor
//! └── excluded_authors.json     # Exclusion list
//! posts/
//! ├── 20240501_103000.json      # Scheduled batch (invocation timestamp)
//! └── 20240502_000000.json      # Recollection day entry (appendable)
//! out/
//! ├── date/2024-05-01/          # data.json, data.csv, index.html
//! ├── user/<handle>/
//! ├── quest/<key>/
//! ├── month/2024-05/
//! └── errors/
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Content type of rendered JSON artifacts.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type of rendered CSV artifacts.
pub const CONTENT_TYPE_CSV: &str = "text/csv; charset=utf-8";
/// Content type of rendered HTML artifacts.
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
/// Content type of plain-text objects (the checkpoint cursor).
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Trait for key-addressed blob storage backends.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Read an object. An absent key is `None`, not an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object with overwrite semantics.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// List object keys under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Read and deserialize a JSON object, `None` if absent.
pub async fn read_json<T: DeserializeOwned>(
    storage: &dyn BlobStorage,
    key: &str,
) -> Result<Option<T>> {
    match storage.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON object.
pub async fn write_json<T: Serialize + ?Sized>(
    storage: &dyn BlobStorage,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    storage.put(key, &bytes, CONTENT_TYPE_JSON).await
}
