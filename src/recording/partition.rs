//! Partitioning rules.
//!
//! Each rule is a pure function from a report to the partition key of one
//! domain axis. The list axes map every report into the single aggregate
//! partition rendered at the axis root (empty key).

use crate::models::RunReport;

/// Domain axis a recorder partitions along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionRule {
    /// One partition per UTC calendar day
    ByDate,
    /// One partition per author handle
    ByUser,
    /// One partition per quest key
    ByQuest,
    /// One partition per calendar month
    ByMonth,
    /// Single aggregate partition listing all authors
    ByUserList,
    /// Single aggregate partition listing all quests
    ByQuestList,
}

impl PartitionRule {
    /// Partition key for one report.
    pub fn key(&self, report: &RunReport) -> String {
        match self {
            Self::ByDate => report.date_key(),
            Self::ByUser => report.author.clone(),
            Self::ByQuest => report.quest_key.clone(),
            Self::ByMonth => report.month_key(),
            Self::ByUserList | Self::ByQuestList => String::new(),
        }
    }
}
