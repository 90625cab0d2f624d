//! Run-report parsing.
//!
//! Converts one raw post into a structured report or a typed failure.
//! The consumed format: the first non-tag line is the headline
//! `<quest> <N> runs`, each following non-tag line an optional drop entry
//! `<item> x<count>`. Lines starting with `#` are tags and are ignored.
//!
//! ```text
//! Ember Gathering 100 runs
//! Ember x31
//! Shard x4
//! #run-report
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::error;

use crate::models::{DropItem, ParseFailure, RawPost, RunReport};

static HEADLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<quest>.+?)\s+(?<runs>\d+)\s*runs?$").expect("headline pattern compiles")
});

static DROP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>.+?)\s*[x×](?<count>\d+)$").expect("drop pattern compiles")
});

/// Why a post could not be parsed into a run report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("post has no content lines")]
    Empty,

    #[error("headline has no run count: {0}")]
    BadHeadline(String),

    #[error("unparseable drop line: {0}")]
    BadDropLine(String),

    #[error("run count out of range: {0}")]
    BadRunCount(String),
}

/// Normalize a quest name into its partition key.
pub fn quest_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !key.is_empty() {
                key.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                key.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    key
}

/// Parse one post into a run report.
pub fn parse_post(post: &RawPost) -> Result<RunReport, ParseError> {
    let mut lines = post
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let headline = lines.next().ok_or(ParseError::Empty)?;
    let captures = HEADLINE
        .captures(headline)
        .ok_or_else(|| ParseError::BadHeadline(headline.to_string()))?;

    let quest = captures["quest"].trim().to_string();
    let runs: u32 = captures["runs"]
        .parse()
        .map_err(|_| ParseError::BadRunCount(captures["runs"].to_string()))?;

    let mut drops = Vec::new();
    for line in lines {
        let captures = DROP_LINE
            .captures(line)
            .ok_or_else(|| ParseError::BadDropLine(line.to_string()))?;
        let count: u32 = captures["count"]
            .parse()
            .map_err(|_| ParseError::BadRunCount(captures["count"].to_string()))?;
        drops.push(DropItem {
            name: captures["name"].trim().to_string(),
            count,
        });
    }

    Ok(RunReport {
        post_id: post.id,
        author: post.author_handle.clone(),
        created_at: post.created_at,
        quest_key: quest_key(&quest),
        quest,
        runs,
        drops,
    })
}

/// Parse every post independently.
///
/// A single failure never aborts the batch; it is captured as a
/// [`ParseFailure`] alongside its siblings' reports.
pub fn parse_all(posts: &[RawPost]) -> (Vec<RunReport>, Vec<ParseFailure>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for post in posts {
        match parse_post(post) {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("failed to parse post {}: {}", post.id, e);
                failures.push(ParseFailure {
                    post: post.clone(),
                    error_message: e.to_string(),
                });
            }
        }
    }

    (reports, failures)
}
