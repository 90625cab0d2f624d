//! The partitioned recorder.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::RunReport;
use crate::recording::{OutputFormat, PartitionRule, SkipPolicy};
use crate::storage::{BlobStorage, read_json};

/// Counters returned by a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Partitions whose artifacts were written
    pub written: usize,
    /// Partitions omitted by the skip policy
    pub skipped: usize,
}

/// Accumulates run reports into named partitions along one axis and
/// materializes them into the blob store.
///
/// Commit merges pending reports into previously persisted partition
/// content (`data.json` is the merge source of truth) unless
/// `ignore_existing` discards it, applies the skip policy unless
/// `force` bypasses it, then writes one artifact per format. Merging is
/// idempotent by post id: re-applying a report a partition already holds
/// reproduces byte-identical artifacts.
pub struct Recorder<'a> {
    rule: PartitionRule,
    skip: SkipPolicy,
    storage: &'a dyn BlobStorage,
    basedir: String,
    formats: Vec<OutputFormat>,
    partitions: BTreeMap<String, Vec<RunReport>>,
}

impl<'a> Recorder<'a> {
    pub fn new(
        rule: PartitionRule,
        skip: SkipPolicy,
        storage: &'a dyn BlobStorage,
        basedir: impl Into<String>,
        formats: Vec<OutputFormat>,
    ) -> Self {
        Self {
            rule,
            skip,
            storage,
            basedir: basedir.into(),
            formats,
            partitions: BTreeMap::new(),
        }
    }

    /// Accumulate reports into their partitions.
    pub fn add_all(&mut self, reports: &[RunReport]) {
        for report in reports {
            self.partitions
                .entry(self.rule.key(report))
                .or_default()
                .push(report.clone());
        }
    }

    /// Number of partitions pending a write.
    pub fn pending_count(&self) -> usize {
        self.partitions.len()
    }

    fn partition_dir(&self, key: &str) -> String {
        if key.is_empty() {
            self.basedir.clone()
        } else {
            format!("{}/{}", self.basedir, key)
        }
    }

    /// Commit pending partitions, one partition and one format at a time.
    pub async fn commit(&mut self, force: bool, ignore_existing: bool) -> Result<CommitStats> {
        let partitions = std::mem::take(&mut self.partitions);
        let mut stats = CommitStats::default();

        for (key, pending) in partitions {
            let dir = self.partition_dir(&key);
            let data_key = format!("{dir}/data.json");

            let mut merged: Vec<RunReport> = if ignore_existing {
                Vec::new()
            } else {
                read_json(self.storage, &data_key).await?.unwrap_or_default()
            };

            for report in pending {
                if !merged.iter().any(|existing| existing.post_id == report.post_id) {
                    merged.push(report);
                }
            }
            merged.sort_by(|a, b| b.post_id.cmp(&a.post_id));

            if !force && self.skip.may_skip(&merged) {
                debug!("skip-save: {}", dir);
                stats.skipped += 1;
                continue;
            }

            for format in &self.formats {
                let bytes = format.render(&key, &merged)?;
                let artifact_key = format!("{dir}/{}", format.file_name());
                self.storage
                    .put(&artifact_key, &bytes, format.content_type())
                    .await?;
            }
            stats.written += 1;
        }

        info!(
            "committed {} under {} ({} written, {} skipped)",
            stats.written + stats.skipped,
            self.basedir,
            stats.written,
            stats.skipped
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn report(id: u64, author: &str, day: u32, runs: u32) -> RunReport {
        RunReport {
            post_id: id,
            author: author.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
            quest: "Vault".to_string(),
            quest_key: "vault".to_string(),
            runs,
            drops: Vec::new(),
        }
    }

    fn date_recorder<'a>(storage: &'a LocalStorage, skip: SkipPolicy) -> Recorder<'a> {
        Recorder::new(
            PartitionRule::ByDate,
            skip,
            storage,
            "out/date",
            vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::DateHtml],
        )
    }

    #[tokio::test]
    async fn test_commit_writes_all_formats() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(1, "a", 1, 10), report(2, "b", 2, 5)]);
        assert_eq!(recorder.pending_count(), 2);

        let stats = recorder.commit(false, false).await.unwrap();
        assert_eq!(stats.written, 2);
        assert_eq!(recorder.pending_count(), 0);

        for file in ["data.json", "data.csv", "index.html"] {
            assert!(
                storage
                    .get(&format!("out/date/2024-05-01/{file}"))
                    .await
                    .unwrap()
                    .is_some()
            );
        }
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(1, "a", 1, 10)]);
        recorder.commit(false, false).await.unwrap();
        let first = storage.get("out/date/2024-05-01/data.json").await.unwrap();

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(1, "a", 1, 10)]);
        recorder.commit(false, false).await.unwrap();
        let second = storage.get("out/date/2024-05-01/data.json").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_merge_keeps_prior_reports() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(1, "a", 1, 10)]);
        recorder.commit(false, false).await.unwrap();

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(2, "b", 1, 5)]);
        recorder.commit(false, false).await.unwrap();

        let merged: Vec<RunReport> = serde_json::from_slice(
            &storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        let ids: Vec<u64> = merged.iter().map(|r| r.post_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_ignore_existing_discards_prior_content() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(1, "purged", 1, 10), report(2, "kept", 1, 5)]);
        recorder.commit(false, false).await.unwrap();

        let mut recorder = date_recorder(&storage, SkipPolicy::Never);
        recorder.add_all(&[report(2, "kept", 1, 5)]);
        recorder.commit(false, true).await.unwrap();

        let merged: Vec<RunReport> = serde_json::from_slice(
            &storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].author, "kept");
    }

    #[tokio::test]
    async fn test_skip_policy_spares_historical_partitions() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let target = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mut recorder = date_recorder(&storage, SkipPolicy::OlderThan(target));
        recorder.add_all(&[report(1, "a", 1, 10), report(2, "b", 2, 5)]);

        let stats = recorder.commit(false, false).await.unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(stats.skipped, 1);
        assert!(
            storage
                .get("out/date/2024-05-01/data.json")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .get("out/date/2024-05-02/data.json")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_force_bypasses_skip_policy() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let target = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mut recorder = date_recorder(&storage, SkipPolicy::OlderThan(target));
        recorder.add_all(&[report(1, "a", 1, 10)]);

        let stats = recorder.commit(true, false).await.unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[tokio::test]
    async fn test_list_partition_renders_at_basedir_root() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut recorder = Recorder::new(
            PartitionRule::ByQuestList,
            SkipPolicy::Never,
            &storage,
            "out/quest",
            vec![OutputFormat::Json, OutputFormat::QuestListHtml],
        );
        recorder.add_all(&[report(1, "a", 1, 10)]);
        recorder.commit(true, false).await.unwrap();

        assert!(storage.get("out/quest/data.json").await.unwrap().is_some());
        assert!(storage.get("out/quest/index.html").await.unwrap().is_some());
    }
}
