//! Feed cursor checkpoint.
//!
//! A single plain-text object holding the id of the newest post observed
//! by a scheduled run. Last-write-wins; read at run start, overwritten at
//! run end only when at least one new post was seen.

use tracing::warn;

use crate::error::Result;
use crate::storage::{BlobStorage, CONTENT_TYPE_TEXT};

/// Reads and writes the feed cursor.
pub struct CheckpointStore<'a> {
    storage: &'a dyn BlobStorage,
    key: String,
}

impl<'a> CheckpointStore<'a> {
    pub fn new(storage: &'a dyn BlobStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Load the cursor. Absent or unparseable content is a cold start,
    /// not an error.
    pub async fn load(&self) -> Result<Option<u64>> {
        let Some(bytes) = self.storage.get(&self.key).await? else {
            warn!("no checkpoint at {}, cold start", self.key);
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&bytes);
        match text.trim().parse::<u64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                warn!("unparseable checkpoint at {}: {:?}", self.key, text);
                Ok(None)
            }
        }
    }

    /// Overwrite the cursor with the newest observed post id.
    pub async fn save(&self, id: u64) -> Result<()> {
        self.storage
            .put(&self.key, id.to_string().as_bytes(), CONTENT_TYPE_TEXT)
            .await
    }
}
