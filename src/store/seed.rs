//! Reader for the pre-seeded `devrel_resources.json` pool.
//!
//! The seed file is hand-maintained and older tooling wrote it with a
//! different record shape (`name` instead of `title`, extra keys such as
//! `stars`), so records are validated here rather than trusted:
//! - non-object records are skipped
//! - a missing `title` falls back to `name`
//! - a missing `type` is set from the array the record sits in
//! - `title` and `description` are HTML-normalized
//! - every other key is carried through untouched

use crate::models::{BLOG_POST, DevRelResources, GITHUB_PROGRAM, JOB_LISTING, Resource};
use crate::store::ResourceStore;
use crate::store::json::values_to_resources;
use crate::utils::clean_html;
use serde::Deserialize;
use serde_json::Value;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, instrument, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedFile {
    github_programs: Option<Vec<Value>>,
    blog_posts: Option<Vec<Value>>,
    job_listings: Option<Vec<Value>>,
}

impl ResourceStore {
    /// Load and normalize the pre-seeded resource pool.
    ///
    /// Never fails: a missing or invalid file yields three empty lists.
    #[instrument(level = "debug", skip(self))]
    pub async fn read_existing_resources(&self) -> DevRelResources {
        let path = self.seed_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No seed file");
                return DevRelResources::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable seed file");
                return DevRelResources::default();
            }
        };

        match parse_seed(&content) {
            Ok(resources) => resources,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid seed file");
                DevRelResources::default()
            }
        }
    }
}

/// Parse and normalize the seed document.
pub fn parse_seed(json: &str) -> Result<DevRelResources, serde_json::Error> {
    let raw: SeedFile = serde_json::from_str(json)?;
    Ok(DevRelResources {
        github_programs: normalize_records(raw.github_programs, GITHUB_PROGRAM),
        blog_posts: normalize_records(raw.blog_posts, BLOG_POST),
        job_listings: normalize_records(raw.job_listings, JOB_LISTING),
    })
}

fn normalize_records(values: Option<Vec<Value>>, default_type: &str) -> Vec<Resource> {
    values_to_resources(values.unwrap_or_default())
        .into_iter()
        .map(|resource| normalize_record(resource, default_type))
        .collect()
}

fn normalize_record(mut resource: Resource, default_type: &str) -> Resource {
    if resource.title.is_empty() {
        if let Some(name) = resource.extra.get("name").and_then(Value::as_str) {
            resource.title = name.to_string();
        }
    }
    if !resource.title.is_empty() {
        resource.title = clean_html(&resource.title);
    }
    resource.description = resource
        .description
        .map(|d| if d.is_empty() { d } else { clean_html(&d) });
    if resource.kind.is_empty() {
        resource.kind = default_type.to_string();
    }
    resource
}
