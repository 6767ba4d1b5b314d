//! Source configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock DevRel source lists.
//!
//! ```yaml
//! blogs:
//!   - https://devrel.net/feed
//! github_topics:
//!   - devrel
//! request_timeout_secs: 30
//! max_retries: 2
//! ```

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Blog feeds scraped when the config does not name any.
pub const DEFAULT_BLOGS: &[&str] = &[
    "https://www.developerrelations.com/feed/",
    "https://devrel.net/feed",
    "https://medium.com/feed/tag/developer-relations",
    "https://www.marythengvall.com/blog?format=rss",
    "https://developerrelations.com/feed",
];

/// GitHub topics scraped when the config does not name any.
pub const DEFAULT_GITHUB_TOPICS: &[&str] = &[
    "developer-relations",
    "devrel",
    "developer-advocacy",
    "developer-experience",
    "developer-community",
];

/// Where to scrape from and how to talk to the network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// RSS/Atom feed URLs for the blog_posts category.
    pub blogs: Vec<String>,
    /// GitHub topic names for the github_repos category.
    pub github_topics: Vec<String>,
    /// Base for topic pages and repository links.
    pub github_base_url: String,
    pub user_agent: String,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Extra attempts after a failed fetch. `0` disables retrying.
    pub max_retries: usize,
    /// First backoff delay; doubles per attempt.
    pub retry_base_delay_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            blogs: DEFAULT_BLOGS.iter().map(|s| s.to_string()).collect(),
            github_topics: DEFAULT_GITHUB_TOPICS.iter().map(|s| s.to_string()).collect(),
            github_base_url: "https://github.com".to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: None,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Parse a YAML sources document. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> Result<SourcesConfig, Box<dyn Error>> {
    if yaml.trim().is_empty() {
        return Ok(SourcesConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load the sources config, falling back to the defaults when no path is given.
///
/// # Errors
///
/// A path that cannot be read or does not parse is an error.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&Path>) -> Result<SourcesConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No sources config given; using built-in sources");
        return Ok(SourcesConfig::default());
    };

    let yaml = fs::read_to_string(path).await?;
    let config = parse_config(&yaml)?;
    info!(
        path = %path.display(),
        blogs = config.blogs.len(),
        topics = config.github_topics.len(),
        "Loaded sources config"
    );
    Ok(config)
}
