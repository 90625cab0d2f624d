//! Gleaner CLI
//!
//! Local execution entry point over filesystem storage. For AWS Lambda,
//! use `gleaner-lambda`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gleaner::{
    error::Result,
    feed::HttpFeedClient,
    models::RebuildRequest,
    pipeline,
    settings::Settings,
    storage::LocalStorage,
};

/// Gleaner - Run-Report Collector
#[derive(Parser, Debug)]
#[command(
    name = "gleaner",
    version,
    about = "Collects run-report posts and renders partitioned artifact sets"
)]
struct Cli {
    /// Path to the storage directory (also holds gleaner.toml)
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one incremental collection from the feed
    Collect,

    /// Re-fetch specific posts by permalink (max 20)
    Recollect {
        /// Post permalinks
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Rebuild every artifact set from the raw post history
    Rebuild {
        /// Exempt partitions older than this date from the refresh
        #[arg(long)]
        skip_target_date: Option<NaiveDate>,

        /// Skip the date render stage
        #[arg(long)]
        skip_date: bool,

        /// Skip the user render stage
        #[arg(long)]
        skip_user: bool,

        /// Skip the quest render stage
        #[arg(long)]
        skip_quest: bool,

        /// Skip the month render stage
        #[arg(long)]
        skip_month: bool,
    },

    /// Validate the settings file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Gleaner starting...");

    let settings_path = cli.storage_dir.join("gleaner.toml");
    let settings = Settings::load_or_default(&settings_path);
    log::info!("Loaded settings from {}", cli.storage_dir.display());

    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Collect => {
            let feed = HttpFeedClient::new(&settings)?;
            let outcome = pipeline::run_collect(&storage, &feed, &settings).await?;

            log::info!(
                "Collected {} posts ({} reports, {} failures)",
                outcome.fetched,
                outcome.reports,
                outcome.failures
            );
        }

        Command::Recollect { urls } => {
            let feed = HttpFeedClient::new(&settings)?;
            let outcome = pipeline::run_recollect(&storage, &feed, &settings, &urls).await?;

            log::info!(
                "Recollected {} of {} requested posts across {} days",
                outcome.fetched,
                outcome.requested,
                outcome.days
            );
        }

        Command::Rebuild {
            skip_target_date,
            skip_date,
            skip_user,
            skip_quest,
            skip_month,
        } => {
            let request = RebuildRequest {
                skip_target_date,
                skip_build_date: skip_date,
                skip_build_user: skip_user,
                skip_build_quest: skip_quest,
                skip_build_month: skip_month,
            };
            let outcome = pipeline::run_rebuild(&storage, &settings, &request).await?;

            log::info!(
                "Rebuilt from {} posts ({} reports, {} failures)",
                outcome.posts,
                outcome.reports,
                outcome.failures
            );
        }

        Command::Validate => {
            log::info!("Validating settings...");

            if let Err(e) = settings.validate() {
                log::error!("Settings validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Settings OK (feed, storage layout, and edge knobs)");
        }
    }

    log::info!("Done!");

    Ok(())
}
