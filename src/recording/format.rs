//! Output formats for partition artifacts.
//!
//! Each partition writes one artifact per requested format. JSON doubles
//! as the merge source of truth, so every format renderer must be
//! deterministic for a given report set.

use askama::Template;

use crate::error::Result;
use crate::models::RunReport;
use crate::recording::html::{PartitionPage, QuestListPage, UserListPage};
use crate::storage::{CONTENT_TYPE_CSV, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON};

/// One artifact flavor a recorder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    DateHtml,
    UserHtml,
    QuestHtml,
    MonthHtml,
    UserListHtml,
    QuestListHtml,
}

impl OutputFormat {
    /// Artifact file name inside the partition directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "data.json",
            Self::Csv => "data.csv",
            _ => "index.html",
        }
    }

    /// Content type of the written artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::Csv => CONTENT_TYPE_CSV,
            _ => CONTENT_TYPE_HTML,
        }
    }

    /// Render the merged partition content into artifact bytes.
    pub fn render(&self, partition_key: &str, reports: &[RunReport]) -> Result<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec_pretty(reports)?),
            Self::Csv => Ok(render_csv(reports)),
            Self::DateHtml => {
                render_page(PartitionPage::new(format!("Runs on {partition_key}"), reports))
            }
            Self::UserHtml => {
                render_page(PartitionPage::new(format!("Runs by {partition_key}"), reports))
            }
            Self::QuestHtml => {
                // Prefer the display name over the slug key.
                let name = reports
                    .first()
                    .map(|report| report.quest.as_str())
                    .unwrap_or(partition_key);
                render_page(PartitionPage::new(format!("Quest: {name}"), reports))
            }
            Self::MonthHtml => {
                render_page(PartitionPage::new(format!("Runs in {partition_key}"), reports))
            }
            Self::UserListHtml => render_page(UserListPage::new(reports)),
            Self::QuestListHtml => render_page(QuestListPage::new(reports)),
        }
    }
}

fn render_page<T: Template>(page: T) -> Result<Vec<u8>> {
    Ok(page.render()?.into_bytes())
}

/// CSV rendering, one row per report.
fn render_csv(reports: &[RunReport]) -> Vec<u8> {
    let mut out = String::from("post_id,date,author,quest,runs,drops\n");
    for report in reports {
        let drops = report
            .drops
            .iter()
            .map(|drop| format!("{}:{}", drop.name, drop.count))
            .collect::<Vec<_>>()
            .join("|");
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            report.post_id,
            report.date_key(),
            csv_escape(&report.author),
            csv_escape(&report.quest),
            report.runs,
            csv_escape(&drops),
        ));
    }
    out.into_bytes()
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
