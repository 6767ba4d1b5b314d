//! # DevRel Resources
//!
//! Scrapes developer-relations resources from blog feeds and GitHub topic
//! pages, merges them with what is already stored, and persists the result
//! as flat JSON files that the resource UI reads directly.
//!
//! ## Features
//!
//! - Scrapes RSS 2.0, RSS 1.0 and Atom feeds into `blog_post` resources
//! - Scrapes GitHub topic listings into `github_program` resources
//! - Normalizes HTML fragments to plain text before storage
//! - Deduplicates by url, keeping the most recently scraped copy
//! - Folds a hand-curated seed file into every merge
//! - Tolerates individual source failures and reports them
//!
//! ## Usage
//!
//! ```sh
//! devrel_resources -d ./app/data            # update (default)
//! devrel_resources -d ./app/data list       # print the combined listing
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: every feed and topic page is downloaded concurrently, with retries
//! 2. **Parsing**: feeds and topic pages are mapped to resources
//! 3. **Merging**: each category is merged with its stored set and the seed pool
//! 4. **Output**: the merged sets are written back and a JSON report is printed

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod fetch;
mod models;
mod scrapers;
mod store;
mod update;
mod utils;

use cli::{Cli, Command};
use fetch::{HttpFetcher, RetryFetch};
use store::ResourceStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    let command = args.command();
    debug!(data_dir = %args.data_dir.display(), config = ?args.config, ?command, "Parsed CLI arguments");
    info!(?command, "devrel_resources starting up");

    let store = ResourceStore::new(&args.data_dir);

    let output = match command {
        Command::Update => {
            // Fail before any network traffic if the results cannot be stored.
            if let Err(e) = ensure_writable_dir(store.data_dir()).await {
                error!(
                    path = %store.data_dir().display(),
                    error = %e,
                    "Data directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let sources = config::load_config(args.config.as_deref()).await?;
            let fetcher = RetryFetch::new(
                HttpFetcher::new(&sources)?,
                sources.max_retries,
                sources.retry_base_delay(),
            );

            let report = update::update_devrel_resources(&fetcher, &sources, &store).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::List => {
            let listing = store::listing::list_resources(&store).await;
            serde_json::to_string_pretty(&listing)?
        }
    };
    println!("{output}");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
