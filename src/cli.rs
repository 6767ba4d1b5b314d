//! Command-line interface definitions for the DevRel resource updater.
//!
//! All options can be provided via command-line flags or environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the DevRel resource updater.
///
/// # Examples
///
/// ```sh
/// # Scrape every source and merge into ./app/data
/// devrel_resources
///
/// # Custom data directory and source list
/// devrel_resources -d /srv/devrel/data -c sources.yaml update
///
/// # Print the combined listing
/// devrel_resources list
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding blog_posts.json, github_repos.json and devrel_resources.json
    #[arg(short, long, env = "DEVREL_DATA_DIR", default_value = "app/data")]
    pub data_dir: PathBuf,

    /// Optional path to a sources YAML file
    #[arg(short, long, env = "DEVREL_SOURCES_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Scrape all sources and merge them into the data directory (default)
    Update,
    /// Print every stored resource as one deduplicated JSON listing
    List,
}

impl Cli {
    /// The subcommand to run; `update` when none was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Update)
    }
}
