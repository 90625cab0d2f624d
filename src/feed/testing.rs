//! In-memory feed client for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::{FeedClient, OPT_OUT_TAG};
use crate::models::RawPost;
use crate::state::ExclusionList;

/// Feed client backed by a fixed post set, counting calls so tests can
/// assert the feed was (not) contacted.
#[derive(Default)]
pub struct MockFeedClient {
    /// Posts returned by `collect`, newest first
    pub timeline: Vec<RawPost>,
    pub collect_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MockFeedClient {
    pub fn with_timeline(timeline: Vec<RawPost>) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }

    pub fn collect_count(&self) -> usize {
        self.collect_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    async fn collect(
        &self,
        _max_pages: usize,
        since_id: Option<u64>,
        exclusions: &mut ExclusionList,
    ) -> Result<Vec<RawPost>> {
        self.collect_calls.fetch_add(1, Ordering::SeqCst);

        let mut collected = Vec::new();
        for post in &self.timeline {
            if let Some(since_id) = since_id {
                if post.id <= since_id {
                    continue;
                }
            }
            if exclusions.contains(&post.author_handle) {
                continue;
            }
            if post.text.contains(OPT_OUT_TAG) {
                exclusions.insert(post.author_handle.clone());
                continue;
            }
            collected.push(post.clone());
        }
        Ok(collected)
    }

    async fn fetch_by_ids(&self, ids: &[u64]) -> Result<HashMap<u64, RawPost>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .timeline
            .iter()
            .filter(|post| ids.contains(&post.id))
            .map(|post| (post.id, post.clone()))
            .collect())
    }
}
