//! AWS Lambda entry point for Gleaner
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! One binary serves all four functions; each deployed function sets
//! `GLEANER_HANDLER` to `collect`, `recollect`, `rebuild`, or
//! `invalidate`.

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};

use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gleaner::error::{AppError, Result};
use gleaner::feed::HttpFeedClient;
use gleaner::models::{RebuildRequest, StorageEvent};
use gleaner::pipeline;
use gleaner::pipeline::invalidate::CloudFrontCache;
use gleaner::settings::Settings;
use gleaner::storage::S3Storage;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> std::result::Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let handler = std::env::var("GLEANER_HANDLER").unwrap_or_else(|_| "collect".to_string());
    info!("Gleaner Lambda starting: {}", handler);

    match handler.as_str() {
        "collect" => lambda_runtime::run(service_fn(collect_handler)).await,
        "recollect" => lambda_runtime::run(service_fn(recollect_handler)).await,
        "rebuild" => lambda_runtime::run(service_fn(rebuild_handler)).await,
        "invalidate" => lambda_runtime::run(service_fn(invalidate_handler)).await,
        other => Err(format!("unknown GLEANER_HANDLER: {other}").into()),
    }
}

/// Wrap an invocation result into the status envelope.
fn respond(result: Result<Value>) -> std::result::Result<Value, LambdaError> {
    match result {
        Ok(detail) => {
            info!("execution successful");
            Ok(json!({ "status": "ok", "detail": detail }))
        }
        Err(e) if e.is_client_error() => {
            error!("rejected request: {}", e);
            Ok(json!({ "status": "error", "error": "bad_request", "message": e.to_string() }))
        }
        Err(e) => {
            error!("execution failed: {}", e);
            Ok(json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

/// Scheduled collection handler.
async fn collect_handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event.payload);
    respond(run_collect().await)
}

async fn run_collect() -> Result<Value> {
    let settings = Settings::from_env();
    let storage = S3Storage::from_env().await?;
    let feed = HttpFeedClient::new(&settings)?;

    let outcome = pipeline::run_collect(&storage, &feed, &settings).await?;
    Ok(json!({
        "fetched": outcome.fetched,
        "reports": outcome.reports,
        "failures": outcome.failures,
    }))
}

/// Recollection handler. The payload must be a JSON array of post
/// permalink strings; anything else is a client error.
async fn recollect_handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event.payload);
    respond(run_recollect(event.payload).await)
}

async fn run_recollect(payload: Value) -> Result<Value> {
    // TODO rate-limit this entry point before exposing it more widely.
    let Value::Array(entries) = payload else {
        return Err(AppError::invalid_request("payload must be a list of urls"));
    };

    let mut urls = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(url) => urls.push(url),
            _ => return Err(AppError::invalid_request("payload entries must be strings")),
        }
    }

    let settings = Settings::from_env();
    let storage = S3Storage::from_env().await?;
    let feed = HttpFeedClient::new(&settings)?;

    let outcome = pipeline::run_recollect(&storage, &feed, &settings, &urls).await?;
    Ok(json!({
        "requested": outcome.requested,
        "candidates": outcome.candidates,
        "fetched": outcome.fetched,
        "days": outcome.days,
    }))
}

/// Rebuild handler.
async fn rebuild_handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event.payload);
    respond(run_rebuild(event.payload).await)
}

async fn run_rebuild(payload: Value) -> Result<Value> {
    let request: RebuildRequest = serde_json::from_value(payload)
        .map_err(|e| AppError::invalid_request(format!("bad rebuild request: {e}")))?;

    let settings = Settings::from_env();
    let storage = S3Storage::from_env().await?;

    let outcome = pipeline::run_rebuild(&storage, &settings, &request).await?;
    Ok(json!({
        "posts": outcome.posts,
        "reports": outcome.reports,
        "failures": outcome.failures,
    }))
}

/// Storage-notification handler for edge cache invalidation.
async fn invalidate_handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event.payload);
    respond(run_invalidate(event.payload).await)
}

async fn run_invalidate(payload: Value) -> Result<Value> {
    let event: StorageEvent = serde_json::from_value(payload)
        .map_err(|e| AppError::invalid_request(format!("bad storage event: {e}")))?;

    let settings = Settings::from_env();
    let edge = CloudFrontCache::from_env().await?;

    pipeline::run_invalidate(&edge, &settings, &event).await?;
    Ok(json!({ "records": event.records.len() }))
}
