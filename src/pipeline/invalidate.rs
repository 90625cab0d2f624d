//! Storage-event-driven edge cache invalidation.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::info;

use crate::error::Result;
use crate::models::StorageEvent;
use crate::settings::Settings;

/// Trait for the CDN edge cache seam.
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Invalidate one cached path.
    async fn invalidate(&self, path: &str, caller_reference: &str) -> Result<()>;
}

/// Decide whether a written object warrants an invalidation, and of
/// which path.
///
/// Only index pages count, and only when the object is large enough to
/// be a real rendered page rather than a blank or stub one; the size
/// threshold is a deliberate approximation, not content inspection. The
/// parent directory is invalidated instead of the object key so both
/// `.../` and `.../index.html` requests see fresh content.
pub fn invalidation_target(key: &str, size: u64, min_bytes: u64) -> Option<String> {
    let path = if key.starts_with('/') {
        key.to_string()
    } else {
        format!("/{key}")
    };

    if !path.ends_with("/index.html") {
        return None;
    }
    if size < min_bytes {
        return None;
    }

    let last_slash = path.rfind('/')?;
    Some(path[..last_slash + 1].to_string())
}

/// Generate a caller reference for one invalidation request.
///
/// Needs to be collision-resistant enough across requests, not
/// cryptographically unique.
pub fn caller_reference(prefix: &str) -> String {
    let t = Utc::now().timestamp();
    let r = rand::rng().random_range(0..1_048_576);
    format!("{prefix}-{t}-{r}")
}

/// Handle one storage-write notification.
pub async fn run_invalidate(
    edge: &dyn EdgeCache,
    settings: &Settings,
    event: &StorageEvent,
) -> Result<()> {
    for record in &event.records {
        let object = &record.s3.object;

        match invalidation_target(&object.key, object.size, settings.edge.min_bytes) {
            Some(path) => {
                info!("cache invalidation: {} ({} bytes)", path, object.size);
                let reference = caller_reference(&settings.edge.caller_prefix);
                edge.invalidate(&path, &reference).await?;
            }
            None => {
                info!("ignore: {} ({} bytes)", object.key, object.size);
            }
        }
    }

    Ok(())
}

/// CloudFront-backed edge cache.
#[cfg(feature = "s3")]
pub struct CloudFrontCache {
    client: aws_sdk_cloudfront::Client,
    distribution_id: String,
}

#[cfg(feature = "s3")]
impl CloudFrontCache {
    pub fn new(client: aws_sdk_cloudfront::Client, distribution_id: impl Into<String>) -> Self {
        Self {
            client,
            distribution_id: distribution_id.into(),
        }
    }

    /// Create a CloudFront cache client from environment configuration.
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = aws_sdk_cloudfront::Client::new(&config);

        let distribution_id = std::env::var("CLOUDFRONT_DISTRIBUTION_ID")
            .map_err(|_| crate::error::AppError::config("CLOUDFRONT_DISTRIBUTION_ID is not set"))?;

        Ok(Self::new(client, distribution_id))
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl EdgeCache for CloudFrontCache {
    async fn invalidate(&self, path: &str, caller_reference: &str) -> Result<()> {
        use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};

        use crate::error::AppError;

        let paths = Paths::builder()
            .quantity(1)
            .items(path.to_string())
            .build()
            .map_err(|e| AppError::EdgeCache(e.to_string()))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference.to_string())
            .build()
            .map_err(|e| AppError::EdgeCache(e.to_string()))?;

        self.client
            .create_invalidation()
            .distribution_id(&self.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| AppError::EdgeCache(e.into_service_error().to_string()))?;

        Ok(())
    }
}
