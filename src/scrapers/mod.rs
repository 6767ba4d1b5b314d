//! Source scrapers that turn third-party pages into [`Resource`] records.
//!
//! Each scraper module exports:
//! - an async `scrape_*` function that fetches one source through a
//!   [`PageFetcher`](crate::fetch::PageFetcher) and returns a [`SourceOutcome`]
//! - a pure `parse_*` function that does the actual extraction, so parsing
//!   can be tested without the network
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Category |
//! |--------|--------|--------|----------|
//! | Blog RSS/Atom feeds | [`rss`] | XML parsing | `blog_posts` |
//! | GitHub topic pages | [`github`] | HTML scraping | `github_repos` |
//!
//! A failing source never fails the run: its outcome is
//! [`SourceOutcome::Failed`], which contributes no resources.

use crate::models::{FailedSource, Resource};

pub mod github;
pub mod rss;

/// Result of scraping one source.
#[derive(Debug)]
pub enum SourceOutcome {
    /// The source was fetched and parsed; may legitimately be empty.
    Fetched(Vec<Resource>),
    /// Fetching or parsing failed.
    Failed { source: String, error: String },
}

impl SourceOutcome {
    /// The scraped resources, or nothing if the source failed.
    pub fn into_resources(self) -> Vec<Resource> {
        match self {
            SourceOutcome::Fetched(resources) => resources,
            SourceOutcome::Failed { .. } => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<FailedSource> {
        match self {
            SourceOutcome::Fetched(_) => None,
            SourceOutcome::Failed { source, error } => Some(FailedSource {
                source: source.clone(),
                error: error.clone(),
            }),
        }
    }
}

/// Flatten a group of outcomes into one resource list plus the failures.
pub fn flatten_outcomes(outcomes: Vec<SourceOutcome>) -> (Vec<Resource>, Vec<FailedSource>) {
    let failures = outcomes.iter().filter_map(SourceOutcome::failure).collect();
    let resources = outcomes
        .into_iter()
        .flat_map(SourceOutcome::into_resources)
        .collect();
    (resources, failures)
}
