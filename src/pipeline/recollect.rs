//! On-demand recollection by post URL.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{AppError, Result};
use crate::feed::{FeedClient, parse_all, parse_post_urls};
use crate::models::{RawPost, far_past};
use crate::recording::UserReportIndex;
use crate::settings::Settings;
use crate::state::PostLog;
use crate::storage::BlobStorage;

use super::render;

/// Hard cap on URLs per recollection call.
pub const MAX_RECOLLECT_URLS: usize = 20;

/// Counters from one recollection call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecollectOutcome {
    pub requested: usize,
    pub candidates: usize,
    pub fetched: usize,
    pub days: usize,
}

/// Group posts by the UTC calendar day they were created on.
pub fn split_posts_by_day(posts: Vec<RawPost>) -> BTreeMap<NaiveDate, Vec<RawPost>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<RawPost>> = BTreeMap::new();
    for post in posts {
        by_day.entry(post.created_date()).or_default().push(post);
    }
    by_day
}

/// Run one recollection call.
///
/// Stricter than the scheduled path by design: recollection is a manual,
/// low-volume correction, so oversized payloads and any unparseable URL
/// reject the whole call with no partial effect. Targets already present
/// in the per-user rendered state are deduplicated away; when nothing
/// remains, the call succeeds without contacting the feed. The cursor
/// and the exclusion list are never touched here.
pub async fn run_recollect(
    storage: &dyn BlobStorage,
    feed: &dyn FeedClient,
    settings: &Settings,
    urls: &[String],
) -> Result<RecollectOutcome> {
    if urls.len() > MAX_RECOLLECT_URLS {
        return Err(AppError::invalid_request(format!(
            "too many urls: {} (max {})",
            urls.len(),
            MAX_RECOLLECT_URLS
        )));
    }

    let targets = parse_post_urls(urls)?;

    let user_basedir = settings.output_base("user");
    let mut candidates: Vec<u64> = Vec::new();
    for (handle, ids) in &targets {
        let index = UserReportIndex::load(storage, &user_basedir, handle).await?;
        for id in ids {
            if index.contains(*id) {
                info!("requested post {} already exists", id);
            } else {
                candidates.push(*id);
            }
        }
    }

    let mut outcome = RecollectOutcome {
        requested: urls.len(),
        candidates: candidates.len(),
        ..RecollectOutcome::default()
    };

    if candidates.is_empty() {
        info!("no candidates");
        return Ok(outcome);
    }
    info!("candidates: {:?}", candidates);

    let fetched = feed.fetch_by_ids(&candidates).await?;
    outcome.fetched = fetched.len();
    if fetched.is_empty() {
        info!("no results");
        return Ok(outcome);
    }

    let log = PostLog::new(storage, &settings.storage.post_log_dir);
    let by_day = split_posts_by_day(fetched.into_values().collect());
    outcome.days = by_day.len();

    for (day, mut posts) in by_day {
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        log.append(&PostLog::day_entry_name(day), &posts).await?;

        let (reports, failures) = parse_all(&posts);
        // Recollected posts may belong to any past day, so the render is
        // never restricted to a recent window.
        render::render_all(storage, settings, &reports, &failures, far_past(), false).await?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::MockFeedClient;
    use crate::storage::LocalStorage;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn post(id: u64, handle: &str, day: u32, text: &str) -> RawPost {
        RawPost {
            id,
            author_id: 1,
            author_handle: handle.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
            text: text.to_string(),
        }
    }

    fn url_for(handle: &str, id: u64) -> String {
        format!("https://feed.example.com/{handle}/status/{id}")
    }

    #[tokio::test]
    async fn test_rejects_oversized_payload_without_feed_contact() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let feed = MockFeedClient::default();
        let settings = Settings::default();

        let urls: Vec<String> = (0..21).map(|id| url_for("alpha", id)).collect();
        let result = run_recollect(&storage, &feed, &settings, &urls).await;

        assert!(matches!(result, Err(e) if e.is_client_error()));
        assert_eq!(feed.fetch_count(), 0);
        assert_eq!(feed.collect_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_url_wholesale() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let feed = MockFeedClient::default();
        let settings = Settings::default();

        let urls = vec![url_for("alpha", 1), "https://feed.example.com/oops".to_string()];
        let result = run_recollect(&storage, &feed, &settings, &urls).await;

        assert!(matches!(result, Err(e) if e.is_client_error()));
        assert_eq!(feed.fetch_count(), 0);
        assert!(storage.list("posts/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_present_is_idempotent_noop() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();

        // Materialize post 7 for alpha through the normal render path.
        let seeded = post(7, "alpha", 1, "Hollow Vault 5 runs");
        let (reports, failures) = parse_all(std::slice::from_ref(&seeded));
        render::render_all(&storage, &settings, &reports, &failures, far_past(), false)
            .await
            .unwrap();

        let feed = MockFeedClient::with_timeline(vec![seeded]);
        let urls = vec![url_for("alpha", 7)];
        let outcome = run_recollect(&storage, &feed, &settings, &urls).await.unwrap();

        assert_eq!(outcome.candidates, 0);
        assert_eq!(outcome.fetched, 0);
        assert_eq!(feed.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_recollect_splits_by_day_and_appends() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();

        let feed = MockFeedClient::with_timeline(vec![
            post(7, "alpha", 1, "Hollow Vault 5 runs"),
            post(9, "beta", 3, "Ember Gathering 12 runs"),
        ]);

        let urls = vec![url_for("alpha", 7), url_for("beta", 9)];
        let outcome = run_recollect(&storage, &feed, &settings, &urls).await.unwrap();

        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.days, 2);
        assert_eq!(feed.fetch_count(), 1);

        // One appendable day entry per affected day.
        let entries = storage.list("posts/").await.unwrap();
        assert_eq!(
            entries,
            vec![
                "posts/20240501_000000.json".to_string(),
                "posts/20240503_000000.json".to_string(),
            ]
        );

        // Both days rendered; cursor untouched.
        assert!(
            storage
                .get("out/date/2024-05-01/index.html")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            storage
                .get("out/date/2024-05-03/index.html")
                .await
                .unwrap()
                .is_some()
        );
        assert!(storage.get("settings/latest_post_id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeat_recollect_converges() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();

        let feed = MockFeedClient::with_timeline(vec![post(
            7,
            "alpha",
            1,
            "Hollow Vault 5 runs",
        )]);
        let urls = vec![url_for("alpha", 7)];

        run_recollect(&storage, &feed, &settings, &urls).await.unwrap();
        let first = storage.get("out/user/alpha/data.json").await.unwrap();

        let outcome = run_recollect(&storage, &feed, &settings, &urls).await.unwrap();
        assert_eq!(outcome.candidates, 0);
        let second = storage.get("out/user/alpha/data.json").await.unwrap();
        assert_eq!(first, second);
    }
}
