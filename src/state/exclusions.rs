//! Blocked source-account list.
//!
//! A JSON array of author handles. Loaded at run start (absent object is
//! an empty set), mutated in memory during collection when authors opt
//! out, persisted at run end only if something changed.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::Result;
use crate::storage::{BlobStorage, read_json, write_json};

/// Mutable set of excluded author handles with a dirty flag.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    handles: BTreeSet<String>,
    dirty: bool,
}

impl ExclusionList {
    /// Load the list; an absent object is an empty set, not an error.
    pub async fn load(storage: &dyn BlobStorage, key: &str) -> Result<Self> {
        let handles: BTreeSet<String> = read_json(storage, key).await?.unwrap_or_default();
        Ok(Self {
            handles,
            dirty: false,
        })
    }

    /// Build a list from handles (tests and rebuild filtering).
    pub fn from_handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handles: handles.into_iter().map(Into::into).collect(),
            dirty: false,
        }
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.handles.contains(handle)
    }

    /// Add a handle; marks the list dirty only on actual change.
    pub fn insert(&mut self, handle: impl Into<String>) {
        if self.handles.insert(handle.into()) {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(String::as_str)
    }

    /// Persist the list if it changed this run. Returns whether a write
    /// happened.
    pub async fn save_if_dirty(&mut self, storage: &dyn BlobStorage, key: &str) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        info!("persisting {} excluded authors to {}", self.handles.len(), key);
        write_json(storage, key, &self.handles).await?;
        self.dirty = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    const KEY: &str = "settings/excluded_authors.json";

    #[tokio::test]
    async fn test_absent_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let exclusions = ExclusionList::load(&storage, KEY).await.unwrap();
        assert!(exclusions.is_empty());
        assert!(!exclusions.is_dirty());
    }

    #[tokio::test]
    async fn test_save_only_when_dirty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut exclusions = ExclusionList::load(&storage, KEY).await.unwrap();
        assert!(!exclusions.save_if_dirty(&storage, KEY).await.unwrap());
        assert!(storage.get(KEY).await.unwrap().is_none());

        exclusions.insert("spammer");
        assert!(exclusions.is_dirty());
        assert!(exclusions.save_if_dirty(&storage, KEY).await.unwrap());
        assert!(!exclusions.is_dirty());

        let reloaded = ExclusionList::load(&storage, KEY).await.unwrap();
        assert!(reloaded.contains("spammer"));
    }

    #[tokio::test]
    async fn test_reinsert_stays_clean() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut exclusions = ExclusionList::from_handles(["spammer"]);
        exclusions.insert("spammer");
        assert!(!exclusions.is_dirty());
        assert!(!exclusions.save_if_dirty(&storage, KEY).await.unwrap());
    }
}
