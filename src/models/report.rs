//! Parsed run-report data structures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::RawPost;

/// One item dropped during a run batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropItem {
    /// Item display name
    pub name: String,

    /// Dropped quantity
    pub count: u32,
}

/// The structured projection of one successfully parsed post.
///
/// Carries every attribute needed to compute partition keys (date,
/// author, quest, month) plus the display fields the rendered pages show.
/// One report per parsed post; immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier of the source post
    pub post_id: u64,

    /// Author handle of the source post
    pub author: String,

    /// Post creation time (UTC)
    pub created_at: DateTime<Utc>,

    /// Quest display name
    pub quest: String,

    /// Normalized quest key used as the partition key
    pub quest_key: String,

    /// Number of runs reported
    pub runs: u32,

    /// Items dropped across the batch
    pub drops: Vec<DropItem>,
}

impl RunReport {
    /// Calendar day (UTC) of the source post.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Date partition key, `YYYY-MM-DD`.
    pub fn date_key(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }

    /// Month partition key, `YYYY-MM`.
    pub fn month_key(&self) -> String {
        self.date().format("%Y-%m").to_string()
    }
}

/// A post that could not be parsed, paired with the error description.
///
/// Failures are recorded and rendered, never dropped; a failure must not
/// block processing of sibling posts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseFailure {
    /// The offending post, kept verbatim
    pub post: RawPost,

    /// Human-readable parse error
    pub error_message: String,
}
