//! Core data model: raw posts, parsed run reports, invocation payloads.

pub mod events;
pub mod post;
pub mod report;

pub use events::{RebuildRequest, StorageEvent};
pub use post::RawPost;
pub use report::{DropItem, ParseFailure, RunReport};

use chrono::NaiveDate;

/// Sentinel skip-target date so far in the past that no partition is
/// exempt from refresh.
pub fn far_past() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date")
}
