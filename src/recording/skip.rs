//! Skip-save policies.
//!
//! The skip-save optimization avoids rewriting historical partitions on
//! every incremental run. Partitions holding any report on or after the
//! skip-target date are never skipped; the aggregate list views use the
//! never-skip policy. A forced commit bypasses the policy entirely.

use chrono::NaiveDate;

use crate::models::RunReport;

/// Rule deciding whether an unchanged-looking partition write may be
/// omitted this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Never skip; every commit writes.
    Never,
    /// A partition may be skipped only when every report in it predates
    /// the target date.
    OlderThan(NaiveDate),
}

impl SkipPolicy {
    /// Whether a partition with the given merged content may be skipped.
    pub fn may_skip(&self, reports: &[RunReport]) -> bool {
        match self {
            Self::Never => false,
            Self::OlderThan(target) => reports.iter().all(|report| report.date() < *target),
        }
    }
}
