//! Per-user rendered-report lookup.
//!
//! Recollection consults the already-rendered per-user partition to find
//! which target posts are already materialized; only absent ids become
//! fetch candidates.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::RunReport;
use crate::storage::{BlobStorage, read_json};

/// The set of post ids already rendered for one author.
#[derive(Debug, Clone, Default)]
pub struct UserReportIndex {
    post_ids: HashSet<u64>,
}

impl UserReportIndex {
    /// Load the index from a user partition. An author with no rendered
    /// partition yet has an empty index.
    pub async fn load(
        storage: &dyn BlobStorage,
        user_basedir: &str,
        handle: &str,
    ) -> Result<Self> {
        let key = format!("{user_basedir}/{handle}/data.json");
        let reports: Vec<RunReport> = read_json(storage, &key).await?.unwrap_or_default();
        Ok(Self {
            post_ids: reports.iter().map(|report| report.post_id).collect(),
        })
    }

    pub fn contains(&self, post_id: u64) -> bool {
        self.post_ids.contains(&post_id)
    }

    pub fn len(&self) -> usize {
        self.post_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post_ids.is_empty()
    }
}
