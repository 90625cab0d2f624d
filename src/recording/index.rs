//! Derived "latest" navigation page builders.
//!
//! Built from the set of already-written leaf pages, never from pending
//! in-memory state, so they must run strictly after the partition writes
//! of their axis complete (leaves before index).

use std::sync::LazyLock;

use askama::Template;
use regex::Regex;
use tracing::info;

use crate::error::Result;
use crate::recording::html::LatestPage;
use crate::storage::{BlobStorage, CONTENT_TYPE_HTML};

static DATE_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"));

static MONTH_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("month pattern compiles"));

async fn build_latest_page(
    storage: &dyn BlobStorage,
    basedir: &str,
    pattern: &Regex,
) -> Result<Option<String>> {
    let prefix = format!("{basedir}/");
    let mut latest: Option<String> = None;

    for key in storage.list(&prefix).await? {
        let Some(rest) = key.strip_prefix(&prefix) else {
            continue;
        };
        let Some((dir, file)) = rest.split_once('/') else {
            continue;
        };
        if file != "index.html" || !pattern.is_match(dir) {
            continue;
        }
        // ISO keys sort chronologically.
        if latest.as_deref() < Some(dir) {
            latest = Some(dir.to_string());
        }
    }

    let Some(latest) = latest else {
        info!("no leaf pages under {}, latest page not built", basedir);
        return Ok(None);
    };

    let page = LatestPage {
        target: format!("../{latest}/"),
    };
    let html = page.render().map_err(crate::error::AppError::from)?;
    storage
        .put(
            &format!("{basedir}/latest/index.html"),
            html.as_bytes(),
            CONTENT_TYPE_HTML,
        )
        .await?;

    info!("latest page under {} points at {}", basedir, latest);
    Ok(Some(latest))
}

/// Rebuilds the latest-day navigation page from written date partitions.
pub struct LatestDatePageBuilder<'a> {
    storage: &'a dyn BlobStorage,
    basedir: String,
}

impl<'a> LatestDatePageBuilder<'a> {
    pub fn new(storage: &'a dyn BlobStorage, basedir: impl Into<String>) -> Self {
        Self {
            storage,
            basedir: basedir.into(),
        }
    }

    pub async fn build(&self) -> Result<Option<String>> {
        build_latest_page(self.storage, &self.basedir, &DATE_DIR).await
    }
}

/// Rebuilds the latest-month navigation page from written month partitions.
pub struct LatestMonthPageBuilder<'a> {
    storage: &'a dyn BlobStorage,
    basedir: String,
}

impl<'a> LatestMonthPageBuilder<'a> {
    pub fn new(storage: &'a dyn BlobStorage, basedir: impl Into<String>) -> Self {
        Self {
            storage,
            basedir: basedir.into(),
        }
    }

    pub async fn build(&self) -> Result<Option<String>> {
        build_latest_page(self.storage, &self.basedir, &MONTH_DIR).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_latest_date_picks_newest() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        for day in ["2024-04-30", "2024-05-02", "2024-05-01"] {
            storage
                .put(
                    &format!("out/date/{day}/index.html"),
                    b"<html></html>",
                    CONTENT_TYPE_HTML,
                )
                .await
                .unwrap();
        }

        let builder = LatestDatePageBuilder::new(&storage, "out/date");
        let latest = builder.build().await.unwrap();
        assert_eq!(latest.as_deref(), Some("2024-05-02"));

        let page = storage
            .get("out/date/latest/index.html")
            .await
            .unwrap()
            .unwrap();
        assert!(String::from_utf8(page).unwrap().contains("../2024-05-02/"));
    }

    #[tokio::test]
    async fn test_latest_ignores_non_partition_dirs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .put("out/date/latest/index.html", b"stale", CONTENT_TYPE_HTML)
            .await
            .unwrap();
        storage
            .put("out/date/2024-05-01/index.html", b"x", CONTENT_TYPE_HTML)
            .await
            .unwrap();

        let builder = LatestDatePageBuilder::new(&storage, "out/date");
        assert_eq!(builder.build().await.unwrap().as_deref(), Some("2024-05-01"));
    }

    #[tokio::test]
    async fn test_latest_noop_without_leaves() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let builder = LatestMonthPageBuilder::new(&storage, "out/month");
        assert_eq!(builder.build().await.unwrap(), None);
        assert!(
            storage
                .get("out/month/latest/index.html")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_latest_month() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        for month in ["2024-04", "2024-05"] {
            storage
                .put(
                    &format!("out/month/{month}/index.html"),
                    b"x",
                    CONTENT_TYPE_HTML,
                )
                .await
                .unwrap();
        }

        let builder = LatestMonthPageBuilder::new(&storage, "out/month");
        assert_eq!(builder.build().await.unwrap().as_deref(), Some("2024-05"));
    }
}
