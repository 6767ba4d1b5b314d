//! Top-level update run: scrape every configured source, then merge and
//! persist each category.
//!
//! # Pipeline
//!
//! 1. **Fetching**: every blog feed and every GitHub topic is scraped
//!    concurrently; the two groups run side by side
//! 2. **Flattening**: each group's outcomes become one list per category
//! 3. **Persisting**: `blog_posts` then `github_repos` are merged and written
//!
//! Source failures are absorbed in step 1. Only a failure to persist ends
//! the run with an error.

use crate::config::SourcesConfig;
use crate::fetch::PageFetcher;
use crate::models::{Category, UpdateCounts, UpdateReport};
use crate::scrapers::{flatten_outcomes, github, rss};
use crate::store::ResourceStore;
use futures::future::join_all;
use std::error::Error;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Scrape all configured sources and fold the results into the stores.
///
/// # Errors
///
/// Returns an error only when a category cannot be written. The error is
/// logged before it is returned.
#[instrument(level = "info", skip_all, fields(blogs = sources.blogs.len(), topics = sources.github_topics.len()))]
pub async fn update_devrel_resources<F: PageFetcher>(
    fetcher: &F,
    sources: &SourcesConfig,
    store: &ResourceStore,
) -> Result<UpdateReport, Box<dyn Error>> {
    match run(fetcher, sources, store).await {
        Ok(report) => Ok(report),
        Err(e) => {
            error!(error = %e, "Error updating DevRel resources");
            Err(e)
        }
    }
}

async fn run<F: PageFetcher>(
    fetcher: &F,
    sources: &SourcesConfig,
    store: &ResourceStore,
) -> Result<UpdateReport, Box<dyn Error>> {
    let t0 = Instant::now();

    let blog_scrapes = join_all(
        sources
            .blogs
            .iter()
            .map(|feed_url| rss::scrape_rss_feed(fetcher, feed_url)),
    );
    let repo_scrapes = join_all(sources.github_topics.iter().map(|topic| {
        github::scrape_github_repos(fetcher, &sources.github_base_url, topic)
    }));
    let (blog_outcomes, repo_outcomes) = futures::join!(blog_scrapes, repo_scrapes);

    let (blog_posts, mut failed_sources) = flatten_outcomes(blog_outcomes);
    let (github_repos, repo_failures) = flatten_outcomes(repo_outcomes);
    failed_sources.extend(repo_failures);

    info!(
        blog_posts = blog_posts.len(),
        github_repos = github_repos.len(),
        failed_sources = failed_sources.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Scraping complete"
    );
    if !failed_sources.is_empty() {
        warn!(sources = ?failed_sources.iter().map(|f| f.source.as_str()).collect::<Vec<_>>(), "Some sources failed and contributed nothing");
    }

    let blogs = store.save_resources(blog_posts, Category::BlogPosts).await?;
    let repos = store.save_resources(github_repos, Category::GithubRepos).await?;

    info!(
        blogs_total = blogs.total,
        blogs_new = blogs.new,
        repos_total = repos.total,
        repos_new = repos.new,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Update complete"
    );

    Ok(UpdateReport {
        status: "success",
        counts: UpdateCounts { blogs, repos },
        failed_sources,
    })
}
