//! Raw post log.
//!
//! Scheduled runs write one immutable entry per invocation, keyed by the
//! wall-clock timestamp (collision-free because the trigger interval far
//! exceeds clock resolution). Recollection appends into one entry per
//! UTC day instead, so a day's entry may accumulate posts from both
//! paths. Raw posts are never discarded, even when parsing fails.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::error::Result;
use crate::models::RawPost;
use crate::state::ExclusionList;
use crate::storage::{BlobStorage, read_json, write_json};

/// Repository over the raw post log entries.
pub struct PostLog<'a> {
    storage: &'a dyn BlobStorage,
    basedir: String,
}

impl<'a> PostLog<'a> {
    pub fn new(storage: &'a dyn BlobStorage, basedir: impl Into<String>) -> Self {
        Self {
            storage,
            basedir: basedir.into(),
        }
    }

    /// Entry name for a scheduled batch collected at `now`.
    pub fn batch_entry_name(now: DateTime<Utc>) -> String {
        format!("{}.json", now.format("%Y%m%d_%H%M%S"))
    }

    /// Entry name for a day's recollection appends.
    pub fn day_entry_name(date: NaiveDate) -> String {
        format!("{}_000000.json", date.format("%Y%m%d"))
    }

    fn entry_key(&self, name: &str) -> String {
        format!("{}/{}", self.basedir, name)
    }

    /// Write one immutable log entry.
    pub async fn put(&self, name: &str, posts: &[RawPost]) -> Result<()> {
        let key = self.entry_key(name);
        info!("writing {} posts to log entry {}", posts.len(), key);
        write_json(self.storage, &key, posts).await
    }

    /// Append posts into an entry, merging by post id.
    ///
    /// The entry may already hold posts from the scheduled path; appended
    /// posts never displace an existing id, and the merged entry is kept
    /// newest-first.
    pub async fn append(&self, name: &str, posts: &[RawPost]) -> Result<()> {
        let key = self.entry_key(name);
        let mut merged: Vec<RawPost> =
            read_json(self.storage, &key).await?.unwrap_or_default();

        for post in posts {
            if !merged.iter().any(|existing| existing.id == post.id) {
                merged.push(post.clone());
            }
        }
        merged.sort_by(|a, b| b.id.cmp(&a.id));

        info!("appending into log entry {} ({} posts total)", key, merged.len());
        write_json(self.storage, &key, &merged).await
    }

    /// Load the complete raw history, newest first, dropping posts whose
    /// author is currently excluded. Exclusion is retroactive only here;
    /// the incremental paths merely stop fetching an excluded author.
    pub async fn read_all(&self, excluded: &ExclusionList) -> Result<Vec<RawPost>> {
        let prefix = format!("{}/", self.basedir);
        let mut posts: Vec<RawPost> = Vec::new();

        for key in self.storage.list(&prefix).await? {
            if !key.ends_with(".json") {
                continue;
            }
            let entry: Vec<RawPost> = read_json(self.storage, &key).await?.unwrap_or_default();
            posts.extend(
                entry
                    .into_iter()
                    .filter(|post| !excluded.contains(&post.author_handle)),
            );
        }

        posts.sort_by(|a, b| b.id.cmp(&a.id));
        posts.dedup_by_key(|post| post.id);
        info!("loaded {} posts from the raw log", posts.len());
        Ok(posts)
    }
}
