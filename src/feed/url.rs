//! Post URL parsing for the recollection entry point.
//!
//! Accepts the canonical permalink form
//! `https://<host>/<handle>/status/<id>` and nothing else. Recollection
//! rejects its whole payload on the first unparseable URL, so every error
//! here is a client error.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{AppError, Result};

/// Parse one post permalink into `(author handle, post id)`.
pub fn parse_post_url(input: &str) -> Result<(String, u64)> {
    let url = Url::parse(input.trim())
        .map_err(|e| AppError::invalid_request(format!("bad url {input:?}: {e}")))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [handle, marker, id] if *marker == "status" && !handle.is_empty() => {
            let id: u64 = id.parse().map_err(|_| {
                AppError::invalid_request(format!("bad post id in url {input:?}"))
            })?;
            Ok(((*handle).to_string(), id))
        }
        _ => Err(AppError::invalid_request(format!(
            "not a post permalink: {input:?}"
        ))),
    }
}

/// Parse a batch of permalinks, grouping target ids by author handle.
///
/// Any single failure fails the whole batch; the map is ordered so the
/// per-author processing order is deterministic.
pub fn parse_post_urls(inputs: &[String]) -> Result<BTreeMap<String, Vec<u64>>> {
    let mut targets: BTreeMap<String, Vec<u64>> = BTreeMap::new();

    for input in inputs {
        let (handle, id) = parse_post_url(input)?;
        let ids = targets.entry(handle).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(targets)
}
