//! Invocation payload shapes for the on-demand entry points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload of the rebuild batch job.
///
/// `skip_target_date` exempts partitions strictly older than it from the
/// refresh; absent means the far-past sentinel (nothing exempt). The four
/// flags skip whole render stages independently.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RebuildRequest {
    pub skip_target_date: Option<NaiveDate>,
    pub skip_build_date: bool,
    pub skip_build_user: bool,
    pub skip_build_quest: bool,
    pub skip_build_month: bool,
}

/// A storage "object written" notification.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    pub size: u64,
}
