//! Status feed access: collection, targeted fetch, report parsing.
//!
//! The feed itself is an external collaborator; this module holds the
//! consumed contract ([`FeedClient`]), the HTTP implementation, and the
//! converters from raw posts to run reports.

pub mod http;
pub mod parse;
#[cfg(test)]
pub mod testing;
pub mod url;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RawPost;
use crate::state::ExclusionList;

// Re-export for convenience
pub use http::HttpFeedClient;
pub use parse::{parse_all, parse_post};
pub use url::{parse_post_url, parse_post_urls};

/// Posts carrying this marker opt their author out of collection; the
/// author lands on the exclusion list and the post is dropped.
pub const OPT_OUT_TAG: &str = "#no-archive";

/// Trait for status feed backends.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch new posts since a cursor, newest first.
    ///
    /// Stops early when the feed is exhausted; `max_pages` caps worst-case
    /// latency and cost per invocation, it does not guarantee completeness.
    /// Posts by excluded authors are dropped, and opt-out posts mutate the
    /// exclusion list in place.
    async fn collect(
        &self,
        max_pages: usize,
        since_id: Option<u64>,
        exclusions: &mut ExclusionList,
    ) -> Result<Vec<RawPost>>;

    /// Fetch specific posts by identifier in one batched call.
    ///
    /// Unknown identifiers are simply absent from the result.
    async fn fetch_by_ids(&self, ids: &[u64]) -> Result<HashMap<u64, RawPost>>;
}
