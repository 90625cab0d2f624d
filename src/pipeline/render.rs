//! Shared render fan-out.
//!
//! Writes one report set across the partition axes and formats in a
//! fixed order: date (then its latest page), user (then the user list),
//! quest (then the quest list), error page. The month axis is a
//! separate, later stage: its partitions are too large for per-run
//! incremental appends, so only the rebuild job renders them, always
//! from scratch, and the latest-month index is rebuilt strictly after
//! the month leaves finish writing.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ParseFailure, RunReport};
use crate::recording::{
    ErrorPageRecorder, LatestDatePageBuilder, LatestMonthPageBuilder, OutputFormat,
    PartitionRule, Recorder, SkipPolicy,
};
use crate::settings::Settings;
use crate::storage::BlobStorage;

/// Render the by-date partitions and refresh the latest-day page.
pub async fn render_date_partitions(
    storage: &dyn BlobStorage,
    settings: &Settings,
    reports: &[RunReport],
    skip_target: NaiveDate,
    ignore_existing: bool,
) -> Result<()> {
    let basedir = settings.output_base("date");
    let mut recorder = Recorder::new(
        PartitionRule::ByDate,
        SkipPolicy::OlderThan(skip_target),
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::DateHtml],
    );
    recorder.add_all(reports);

    if recorder.pending_count() > 0 {
        recorder.commit(false, ignore_existing).await?;
    }

    LatestDatePageBuilder::new(storage, &basedir).build().await?;
    Ok(())
}

/// Render the by-user partitions and the aggregate user list.
pub async fn render_user_partitions(
    storage: &dyn BlobStorage,
    settings: &Settings,
    reports: &[RunReport],
    skip_target: NaiveDate,
    ignore_existing: bool,
) -> Result<()> {
    let basedir = settings.output_base("user");
    let mut recorder = Recorder::new(
        PartitionRule::ByUser,
        SkipPolicy::OlderThan(skip_target),
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::UserHtml],
    );
    recorder.add_all(reports);

    if recorder.pending_count() > 0 {
        recorder.commit(false, ignore_existing).await?;
    }

    let mut list_recorder = Recorder::new(
        PartitionRule::ByUserList,
        SkipPolicy::Never,
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::UserListHtml],
    );
    list_recorder.add_all(reports);

    if list_recorder.pending_count() > 0 {
        list_recorder.commit(false, ignore_existing).await?;
    }

    Ok(())
}

/// Render the by-quest partitions and the aggregate quest list.
///
/// The quest list commit is always forced: its page shows running totals
/// that must advance on every ingestion even when the distinct-quest
/// membership is unchanged.
pub async fn render_quest_partitions(
    storage: &dyn BlobStorage,
    settings: &Settings,
    reports: &[RunReport],
    skip_target: NaiveDate,
    ignore_existing: bool,
) -> Result<()> {
    let basedir = settings.output_base("quest");
    let mut recorder = Recorder::new(
        PartitionRule::ByQuest,
        SkipPolicy::OlderThan(skip_target),
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::QuestHtml],
    );
    recorder.add_all(reports);

    if recorder.pending_count() > 0 {
        recorder.commit(false, ignore_existing).await?;
    }

    let mut list_recorder = Recorder::new(
        PartitionRule::ByQuestList,
        SkipPolicy::Never,
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::QuestListHtml],
    );
    list_recorder.add_all(reports);
    list_recorder.commit(true, ignore_existing).await?;

    Ok(())
}

/// Render the month partitions, then the latest-month page.
///
/// Month partitions never merge with prior persisted state; they are
/// recomputed from the full report set each time.
pub async fn render_month_partitions(
    storage: &dyn BlobStorage,
    settings: &Settings,
    reports: &[RunReport],
    skip_target: NaiveDate,
) -> Result<()> {
    let basedir = settings.output_base("month");
    let mut recorder = Recorder::new(
        PartitionRule::ByMonth,
        SkipPolicy::OlderThan(skip_target),
        storage,
        &basedir,
        vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::MonthHtml],
    );
    recorder.add_all(reports);

    if recorder.pending_count() > 0 {
        recorder.commit(false, true).await?;
    }

    // Only valid once the month leaves are written.
    LatestMonthPageBuilder::new(storage, &basedir).build().await?;
    Ok(())
}

/// Render the parse-failure page.
pub async fn render_error_page(
    storage: &dyn BlobStorage,
    settings: &Settings,
    failures: &[ParseFailure],
    ignore_existing: bool,
) -> Result<()> {
    let mut recorder = ErrorPageRecorder::new(storage, settings.output_base("errors"));
    recorder.add_all(failures);
    recorder.save(ignore_existing).await
}

/// The full fan-out used by the incremental paths.
pub async fn render_all(
    storage: &dyn BlobStorage,
    settings: &Settings,
    reports: &[RunReport],
    failures: &[ParseFailure],
    skip_target: NaiveDate,
    ignore_existing: bool,
) -> Result<()> {
    render_date_partitions(storage, settings, reports, skip_target, ignore_existing).await?;
    render_user_partitions(storage, settings, reports, skip_target, ignore_existing).await?;
    render_quest_partitions(storage, settings, reports, skip_target, ignore_existing).await?;
    render_error_page(storage, settings, failures, ignore_existing).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunReport, far_past};
    use crate::storage::LocalStorage;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn report(id: u64, quest: &str, runs: u32) -> RunReport {
        RunReport {
            post_id: id,
            author: "runner".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            quest: quest.to_string(),
            quest_key: crate::feed::parse::quest_key(quest),
            runs,
            drops: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_quest_list_counters_advance_without_new_quests() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();

        render_quest_partitions(&storage, &settings, &[report(1, "Vault", 10)], far_past(), false)
            .await
            .unwrap();
        let first = storage.get("out/quest/index.html").await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).contains("10"));

        // Same quest again: membership unchanged, totals must still move.
        render_quest_partitions(&storage, &settings, &[report(2, "Vault", 5)], far_past(), false)
            .await
            .unwrap();
        let second = storage.get("out/quest/index.html").await.unwrap().unwrap();
        assert_ne!(first, second);
        assert!(String::from_utf8_lossy(&second).contains("15"));
    }

    #[tokio::test]
    async fn test_month_stage_builds_index_after_leaves() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let settings = Settings::default();

        render_month_partitions(&storage, &settings, &[report(1, "Vault", 10)], far_past())
            .await
            .unwrap();

        assert!(storage.get("out/month/2024-05/index.html").await.unwrap().is_some());
        let latest = storage
            .get("out/month/latest/index.html")
            .await
            .unwrap()
            .unwrap();
        assert!(String::from_utf8_lossy(&latest).contains("../2024-05/"));
    }
}
