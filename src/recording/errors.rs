//! Parse-failure page recording.

use askama::Template;
use tracing::info;

use crate::error::Result;
use crate::models::ParseFailure;
use crate::recording::html::ErrorPage;
use crate::storage::{BlobStorage, CONTENT_TYPE_HTML, read_json, write_json};

/// Renders accumulated parse failures into a dedicated error view.
///
/// Follows the recorder's merge semantics: failures merge by post id
/// into the previously persisted set unless `ignore_existing` discards
/// it. There is no skip policy; the page is rewritten on every save.
pub struct ErrorPageRecorder<'a> {
    storage: &'a dyn BlobStorage,
    basedir: String,
    pending: Vec<ParseFailure>,
}

impl<'a> ErrorPageRecorder<'a> {
    pub fn new(storage: &'a dyn BlobStorage, basedir: impl Into<String>) -> Self {
        Self {
            storage,
            basedir: basedir.into(),
            pending: Vec::new(),
        }
    }

    /// Accumulate failures for the next save.
    pub fn add_all(&mut self, failures: &[ParseFailure]) {
        self.pending.extend_from_slice(failures);
    }

    /// Merge and write the error artifacts.
    pub async fn save(&mut self, ignore_existing: bool) -> Result<()> {
        let data_key = format!("{}/data.json", self.basedir);

        let mut merged: Vec<ParseFailure> = if ignore_existing {
            Vec::new()
        } else {
            read_json(self.storage, &data_key).await?.unwrap_or_default()
        };

        for failure in self.pending.drain(..) {
            if !merged.iter().any(|existing| existing.post.id == failure.post.id) {
                merged.push(failure);
            }
        }
        merged.sort_by(|a, b| b.post.id.cmp(&a.post.id));

        write_json(self.storage, &data_key, &merged).await?;

        let page = ErrorPage::new(&merged);
        let html = page.render().map_err(crate::error::AppError::from)?;
        self.storage
            .put(
                &format!("{}/index.html", self.basedir),
                html.as_bytes(),
                CONTENT_TYPE_HTML,
            )
            .await?;

        info!("error page updated with {} failures", merged.len());
        Ok(())
    }
}
