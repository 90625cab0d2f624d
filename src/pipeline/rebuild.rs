//! Full rebuild from the raw post history.

use tracing::info;

use crate::error::Result;
use crate::feed::parse_all;
use crate::models::{RebuildRequest, far_past};
use crate::settings::Settings;
use crate::state::{ExclusionList, PostLog};
use crate::storage::BlobStorage;

use super::render;

/// Counters from one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub posts: usize,
    pub reports: usize,
    pub failures: usize,
}

/// Run one rebuild batch job.
///
/// Replays every previously persisted raw log entry with the exclusion
/// list applied retroactively, then re-renders each non-skipped stage
/// from scratch (`ignore_existing`), so excluded-author removal and
/// historical corrections land even when they shrink a partition. One
/// deterministic pass per stage; the skip-target date exempts partitions
/// older than it, defaulting to the far-past sentinel (nothing exempt).
pub async fn run_rebuild(
    storage: &dyn BlobStorage,
    settings: &Settings,
    request: &RebuildRequest,
) -> Result<RebuildOutcome> {
    let skip_target = request.skip_target_date.unwrap_or_else(far_past);
    info!("skip target date: {}", skip_target);

    let exclusions = ExclusionList::load(storage, &settings.exclusions_key()).await?;

    let log = PostLog::new(storage, &settings.storage.post_log_dir);
    let posts = log.read_all(&exclusions).await?;
    info!("retrieved {} posts", posts.len());

    let (reports, failures) = parse_all(&posts);

    if request.skip_build_date {
        info!("skip building date contents");
    } else {
        render::render_date_partitions(storage, settings, &reports, skip_target, true).await?;
    }

    if request.skip_build_user {
        info!("skip building user contents");
    } else {
        render::render_user_partitions(storage, settings, &reports, skip_target, true).await?;
    }

    if request.skip_build_quest {
        info!("skip building quest contents");
    } else {
        render::render_quest_partitions(storage, settings, &reports, skip_target, true).await?;
    }

    if request.skip_build_month {
        info!("skip building month contents");
    } else {
        render::render_month_partitions(storage, settings, &reports, skip_target).await?;
    }

    render::render_error_page(storage, settings, &failures, true).await?;
    info!("finished rebuilding outputs");

    Ok(RebuildOutcome {
        posts: posts.len(),
        reports: reports.len(),
        failures: failures.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawPost, RunReport};
    use crate::state::PostLog;
    use crate::storage::LocalStorage;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn post(id: u64, handle: &str, month: u32, day: u32, text: &str) -> RawPost {
        RawPost {
            id,
            author_id: 1,
            author_handle: handle.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap(),
            text: text.to_string(),
        }
    }

    async fn seed_history(storage: &LocalStorage) {
        let log = PostLog::new(storage, "posts");
        log.put(
            "20240501_080000.json",
            &[
                post(1, "alpha", 5, 1, "Hollow Vault 5 runs"),
                post(2, "spammer", 5, 1, "Hollow Vault 500 runs"),
            ],
        )
        .await
        .unwrap();
        log.put(
            "20240601_080000.json",
            &[post(3, "alpha", 6, 1, "Ember Gathering 10 runs")],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_renders_all_stages() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();
        seed_history(&storage).await;

        let outcome = run_rebuild(&storage, &settings, &RebuildRequest::default())
            .await
            .unwrap();
        assert_eq!(outcome.posts, 3);
        assert_eq!(outcome.reports, 3);

        assert!(
            storage
                .get("out/date/2024-05-01/index.html")
                .await
                .unwrap()
                .is_some()
        );
        assert!(storage.get("out/user/alpha/data.json").await.unwrap().is_some());
        assert!(storage.get("out/quest/index.html").await.unwrap().is_some());
        assert!(
            storage
                .get("out/month/2024-05/data.json")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            storage
                .get("out/month/latest/index.html")
                .await
                .unwrap()
                .is_some()
        );
        assert!(storage.get("out/errors/index.html").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rebuild_applies_exclusions_retroactively() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();
        seed_history(&storage).await;

        // First rebuild materializes the spammer's report.
        run_rebuild(&storage, &settings, &RebuildRequest::default())
            .await
            .unwrap();
        let merged: Vec<RunReport> = serde_json::from_slice(
            &storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(merged.len(), 2);

        // Exclude the author, rebuild again: the partition shrinks even
        // though the raw history still holds the post.
        let mut exclusions = ExclusionList::default();
        exclusions.insert("spammer");
        exclusions
            .save_if_dirty(&storage, &settings.exclusions_key())
            .await
            .unwrap();

        let outcome = run_rebuild(&storage, &settings, &RebuildRequest::default())
            .await
            .unwrap();
        assert_eq!(outcome.posts, 2);

        let merged: Vec<RunReport> = serde_json::from_slice(
            &storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].author, "alpha");

        let log = PostLog::new(&storage, "posts");
        let raw = log.read_all(&ExclusionList::default()).await.unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[tokio::test]
    async fn test_stage_flags_skip_work() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();
        seed_history(&storage).await;

        let request = RebuildRequest {
            skip_build_date: true,
            skip_build_month: true,
            ..RebuildRequest::default()
        };
        run_rebuild(&storage, &settings, &request).await.unwrap();

        assert!(
            storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .get("out/month/2024-05/data.json")
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.get("out/user/alpha/data.json").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_skip_target_spares_historical_partitions() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();
        seed_history(&storage).await;

        let request = RebuildRequest {
            skip_target_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            ..RebuildRequest::default()
        };
        run_rebuild(&storage, &settings, &request).await.unwrap();

        // May 1 predates the target and is left untouched; June 1 is
        // rendered.
        assert!(
            storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .get("out/date/2024-06-01/data.json")
                .await
                .unwrap()
                .is_some()
        );
    }
}
