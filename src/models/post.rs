//! Raw post data structure.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An immutable copy of one fetched feed post.
///
/// Produced by the feed collector and persisted verbatim into the raw
/// post log; never mutated after creation, even when parsing fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawPost {
    /// Feed-native post identifier
    pub id: u64,

    /// Feed-native author identifier
    pub author_id: u64,

    /// Author handle (screen name)
    pub author_handle: String,

    /// Post creation time (UTC)
    pub created_at: DateTime<Utc>,

    /// Raw post text as fetched
    pub text: String,
}

impl RawPost {
    /// Calendar day (UTC) the post was created on.
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
