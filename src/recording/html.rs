//! Askama page models for the rendered HTML artifacts.

use std::collections::BTreeMap;

use askama::Template;

use crate::models::{ParseFailure, RunReport};

/// One report row as shown on a partition page.
pub struct ReportRow {
    pub date: String,
    pub author: String,
    pub quest: String,
    pub runs: u32,
    pub drops: String,
}

impl ReportRow {
    fn from_report(report: &RunReport) -> Self {
        Self {
            date: report.date_key(),
            author: report.author.clone(),
            quest: report.quest.clone(),
            runs: report.runs,
            drops: format_drops(report),
        }
    }
}

/// Drops as a compact `name x count` list.
pub fn format_drops(report: &RunReport) -> String {
    report
        .drops
        .iter()
        .map(|drop| format!("{} x{}", drop.name, drop.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Leaf partition page (date, user, quest and month flavors).
#[derive(Template)]
#[template(path = "partition.html")]
pub struct PartitionPage {
    pub title: String,
    pub total_reports: usize,
    pub total_runs: u64,
    pub rows: Vec<ReportRow>,
}

impl PartitionPage {
    pub fn new(title: impl Into<String>, reports: &[RunReport]) -> Self {
        Self {
            title: title.into(),
            total_reports: reports.len(),
            total_runs: reports.iter().map(|r| u64::from(r.runs)).sum(),
            rows: reports.iter().map(ReportRow::from_report).collect(),
        }
    }
}

/// One aggregate row on a list page.
pub struct AggregateRow {
    /// Display label (author handle or quest name)
    pub label: String,
    /// Link target relative to the list page
    pub href: String,
    pub reports: usize,
    pub total_runs: u64,
    pub last_date: String,
}

/// Aggregate reports into list rows keyed by an axis extractor.
///
/// Rows are ordered by descending total runs, then by label, so the
/// rendered page is deterministic for a given report set.
fn aggregate_rows<F>(reports: &[RunReport], key: F) -> Vec<AggregateRow>
where
    F: Fn(&RunReport) -> (String, String),
{
    let mut groups: BTreeMap<(String, String), (usize, u64, String)> = BTreeMap::new();

    for report in reports {
        let entry = groups
            .entry(key(report))
            .or_insert((0, 0, String::new()));
        entry.0 += 1;
        entry.1 += u64::from(report.runs);
        let date = report.date_key();
        if date > entry.2 {
            entry.2 = date;
        }
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|((label, slug), (reports, total_runs, last_date))| AggregateRow {
            href: format!("{slug}/"),
            label,
            reports,
            total_runs,
            last_date,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_runs
            .cmp(&a.total_runs)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}

/// Aggregate list of authors.
#[derive(Template)]
#[template(path = "user_list.html")]
pub struct UserListPage {
    pub total_reports: usize,
    pub total_runs: u64,
    pub rows: Vec<AggregateRow>,
}

impl UserListPage {
    pub fn new(reports: &[RunReport]) -> Self {
        Self {
            total_reports: reports.len(),
            total_runs: reports.iter().map(|r| u64::from(r.runs)).sum(),
            rows: aggregate_rows(reports, |r| (r.author.clone(), r.author.clone())),
        }
    }
}

/// Aggregate list of quests with running totals.
#[derive(Template)]
#[template(path = "quest_list.html")]
pub struct QuestListPage {
    pub total_reports: usize,
    pub total_runs: u64,
    pub rows: Vec<AggregateRow>,
}

impl QuestListPage {
    pub fn new(reports: &[RunReport]) -> Self {
        Self {
            total_reports: reports.len(),
            total_runs: reports.iter().map(|r| u64::from(r.runs)).sum(),
            rows: aggregate_rows(reports, |r| (r.quest.clone(), r.quest_key.clone())),
        }
    }
}

/// One failed-to-parse post row.
pub struct ErrorRow {
    pub post_id: u64,
    pub author: String,
    pub created_at: String,
    pub message: String,
    pub text: String,
}

/// Parse failure report page.
#[derive(Template)]
#[template(path = "errors.html")]
pub struct ErrorPage {
    pub total: usize,
    pub rows: Vec<ErrorRow>,
}

impl ErrorPage {
    pub fn new(failures: &[ParseFailure]) -> Self {
        Self {
            total: failures.len(),
            rows: failures
                .iter()
                .map(|failure| ErrorRow {
                    post_id: failure.post.id,
                    author: failure.post.author_handle.clone(),
                    created_at: failure.post.created_at.to_rfc3339(),
                    message: failure.error_message.clone(),
                    text: failure.post.text.clone(),
                })
                .collect(),
        }
    }
}

/// Redirect stub pointing navigation at the newest leaf partition.
#[derive(Template)]
#[template(path = "latest.html")]
pub struct LatestPage {
    pub target: String,
}
