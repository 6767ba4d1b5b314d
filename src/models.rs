//! Data models for scraped resources and the reports built from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Resource`]: One blog post, GitHub program, or job listing
//! - [`Category`]: The two independently persisted collections
//! - [`DevRelResources`]: The shape of the pre-seeded resource file
//! - [`SaveStats`] / [`UpdateReport`]: Counts reported after a merge pass

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Resource type for a GitHub repository or program.
pub const GITHUB_PROGRAM: &str = "github_program";
/// Resource type for a blog post.
pub const BLOG_POST: &str = "blog_post";
/// Resource type for a job listing. Only found in pre-seeded data.
pub const JOB_LISTING: &str = "job_listing";

/// A single resource as persisted in the flat JSON stores.
///
/// `url` is the dedup key. Every field is defaulted on input so that
/// hand-curated records with missing keys still load; any keys this struct
/// does not know about are carried through in [`Resource::extra`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Resource {
    /// Human-readable name, HTML-normalized before storage.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Canonical link, used as the dedup key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only populated for blog posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publish date exactly as the source provided it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// One of [`GITHUB_PROGRAM`], [`BLOG_POST`] or [`JOB_LISTING`].
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Hostname or fixed literal, for attribution only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// ISO-8601 timestamp set at scrape time. Newer wins on url conflicts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub added_at: String,
    /// Fields present in the input that are not part of the core record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// `null` reads the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Resource {
    /// Parse `added_at` into a UTC instant, if it is in a recognisable format.
    pub fn added_at_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.added_at)
    }

    /// Returns `true` when `self` should replace `other` during a merge.
    ///
    /// An unparseable timestamp on either side never wins.
    pub fn is_newer_than(&self, other: &Resource) -> bool {
        match (self.added_at_instant(), other.added_at_instant()) {
            (Some(mine), Some(theirs)) => mine > theirs,
            _ => false,
        }
    }
}

/// Current time in the `YYYY-MM-DDTHH:MM:SS.mmmZ` form used for `added_at`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the timestamp formats that show up in `added_at`.
///
/// Accepts RFC 3339, naive date-times (treated as UTC), bare dates and
/// RFC 2822.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One of the two independently persisted resource collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    BlogPosts,
    GithubRepos,
}

impl Category {
    /// File name of the flat store for this category.
    pub fn file_name(self) -> &'static str {
        match self {
            Category::BlogPosts => "blog_posts.json",
            Category::GithubRepos => "github_repos.json",
        }
    }

    /// Resource type produced by the fetchers feeding this category.
    pub fn resource_type(self) -> &'static str {
        match self {
            Category::BlogPosts => BLOG_POST,
            Category::GithubRepos => GITHUB_PROGRAM,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::BlogPosts => f.write_str("blog_posts"),
            Category::GithubRepos => f.write_str("github_repos"),
        }
    }
}

/// The pre-seeded, manually curated resource file.
///
/// Never written by this crate; folded into every merge pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DevRelResources {
    pub github_programs: Vec<Resource>,
    pub blog_posts: Vec<Resource>,
    pub job_listings: Vec<Resource>,
}

impl DevRelResources {
    /// The seed pool merged into the given category.
    pub fn into_pool(self, category: Category) -> Vec<Resource> {
        match category {
            Category::BlogPosts => self.blog_posts,
            Category::GithubRepos => self.github_programs,
        }
    }
}

/// Result of one merge/persist pass over a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaveStats {
    /// Size of the deduplicated set written to disk.
    pub total: usize,
    /// `total` minus the size of the previously persisted set.
    pub new: i64,
}

/// Per-category counts of an update run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCounts {
    pub blogs: SaveStats,
    pub repos: SaveStats,
}

/// A source whose fetch or parse failed during an update run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSource {
    pub source: String,
    pub error: String,
}

/// What an update run reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    /// Always `"success"`; failures are returned as errors instead.
    pub status: &'static str,
    pub counts: UpdateCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<FailedSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(url: &str, added_at: &str) -> Resource {
        Resource {
            title: "Title".to_string(),
            url: url.to_string(),
            kind: BLOG_POST.to_string(),
            added_at: added_at.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resource_omits_absent_optionals() {
        let r = resource("https://example.com/a", "2025-01-01T00:00:00.000Z");
        let json = serde_json::to_value(&r).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["type"], "blog_post");
        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("author"));
        assert!(!obj.contains_key("source"));
    }

    #[test]
    fn test_resource_keeps_unknown_fields() {
        let json = r#"{
            "name": "awesome-devrel",
            "url": "https://github.com/x/awesome-devrel",
            "stars": 120,
            "type": "repository"
        }"#;

        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.kind, "repository");
        assert_eq!(r.extra["stars"], 120);

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["name"], "awesome-devrel");
        assert_eq!(back["stars"], 120);
    }

    #[test]
    fn test_resource_null_fields_read_as_missing() {
        let json = r#"{
            "title": null,
            "url": "https://github.com/x/y",
            "type": null,
            "added_at": null,
            "description": null,
            "name": "y"
        }"#;

        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.url, "https://github.com/x/y");
        assert_eq!(r.kind, "");
        assert_eq!(r.added_at, "");
        assert!(r.description.is_none());
        assert_eq!(r.extra["name"], "y");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-05-06T14:30:00.123Z").is_some());
        assert!(parse_timestamp("2025-05-06T14:30:00+02:00").is_some());
        assert!(parse_timestamp("2025-05-06T14:30:00").is_some());
        assert!(parse_timestamp("2025-05-06").is_some());
        assert!(parse_timestamp("Tue, 06 May 2025 14:30:00 +0000").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_is_newer_than() {
        let old = resource("u", "2025-01-01T00:00:00.000Z");
        let new = resource("u", "2025-06-01T00:00:00.000Z");
        let broken = resource("u", "not a date");

        assert!(new.is_newer_than(&old));
        assert!(!old.is_newer_than(&new));
        assert!(!broken.is_newer_than(&old));
        assert!(!new.is_newer_than(&broken));
    }

    #[test]
    fn test_now_timestamp_round_trips() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(parse_timestamp(&ts).is_some());
    }

    #[test]
    fn test_category_files() {
        assert_eq!(Category::BlogPosts.file_name(), "blog_posts.json");
        assert_eq!(Category::GithubRepos.file_name(), "github_repos.json");
        assert_eq!(Category::GithubRepos.resource_type(), GITHUB_PROGRAM);
        assert_eq!(Category::BlogPosts.to_string(), "blog_posts");
    }

    #[test]
    fn test_update_report_serialization() {
        let report = UpdateReport {
            status: "success",
            counts: UpdateCounts {
                blogs: SaveStats { total: 13, new: 3 },
                repos: SaveStats { total: 0, new: 0 },
            },
            failed_sources: vec![],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["counts"]["blogs"]["total"], 13);
        assert_eq!(json["counts"]["blogs"]["new"], 3);
        assert!(json.get("failed_sources").is_none());
    }
}
