//! HTTP implementation of the feed client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::feed::{FeedClient, OPT_OUT_TAG};
use crate::models::RawPost;
use crate::settings::Settings;
use crate::state::ExclusionList;

/// Feed client talking to the status search API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    query: String,
    page_size: usize,
}

/// One post as the feed API returns it.
#[derive(Debug, Deserialize)]
struct ApiPost {
    id: u64,
    author: ApiAuthor,
    created_at: DateTime<Utc>,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    id: u64,
    handle: String,
}

impl From<ApiPost> for RawPost {
    fn from(post: ApiPost) -> Self {
        Self {
            id: post.id,
            author_id: post.author.id,
            author_handle: post.author.handle,
            created_at: post.created_at,
            text: post.text,
        }
    }
}

impl HttpFeedClient {
    /// Create a configured feed client.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.http.user_agent)
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.feed.base_url.trim_end_matches('/').to_string(),
            token: settings.feed.token.clone(),
            query: settings.feed.query.clone(),
            page_size: settings.feed.page_size,
        })
    }

    /// Fetch one search page, newest first.
    async fn search_page(
        &self,
        since_id: Option<u64>,
        max_id: Option<u64>,
    ) -> Result<Vec<ApiPost>> {
        let url = format!("{}/statuses/search", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("q", self.query.as_str())])
            .query(&[("count", self.page_size)]);

        if let Some(since_id) = since_id {
            request = request.query(&[("since_id", since_id)]);
        }
        if let Some(max_id) = max_id {
            request = request.query(&[("max_id", max_id)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AppError::feed(format!(
                "search returned {} for {}",
                response.status(),
                url
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn collect(
        &self,
        max_pages: usize,
        since_id: Option<u64>,
        exclusions: &mut ExclusionList,
    ) -> Result<Vec<RawPost>> {
        let mut collected: Vec<RawPost> = Vec::new();
        let mut max_id: Option<u64> = None;

        for page in 0..max_pages {
            let batch = self.search_page(since_id, max_id).await?;
            debug!("page {}: {} posts", page + 1, batch.len());

            if batch.is_empty() {
                break;
            }

            let page_len = batch.len();
            // Pages are newest-first; the next page continues below the
            // oldest id seen so far.
            max_id = batch.last().map(|post| post.id.saturating_sub(1));

            for post in batch {
                let post = RawPost::from(post);
                if exclusions.contains(&post.author_handle) {
                    debug!("dropping post {} by excluded author", post.id);
                    continue;
                }
                if post.text.contains(OPT_OUT_TAG) {
                    info!("author {} opted out, excluding", post.author_handle);
                    exclusions.insert(post.author_handle.clone());
                    continue;
                }
                collected.push(post);
            }

            if page_len < self.page_size {
                // Upstream exhausted before the page budget.
                break;
            }
        }

        Ok(collected)
    }

    async fn fetch_by_ids(&self, ids: &[u64]) -> Result<HashMap<u64, RawPost>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/statuses/lookup", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("ids", id_list.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::feed(format!(
                "lookup returned {} for {}",
                response.status(),
                url
            )));
        }

        let posts: Vec<ApiPost> = response.json().await?;
        Ok(posts
            .into_iter()
            .map(|post| (post.id, RawPost::from(post)))
            .collect())
    }
}
