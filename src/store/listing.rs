//! Read-only combined view of every store, as served to the resource UI.
//!
//! Unlike a save pass, the listing keeps the FIRST record seen for each url
//! and never writes anything back.

use crate::models::{Category, DevRelResources, GITHUB_PROGRAM, JOB_LISTING, Resource};
use crate::store::ResourceStore;
use crate::utils::clean_html;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

/// Response body of the listing.
#[derive(Debug, Serialize)]
pub struct ResourceListing {
    pub resources: Vec<Resource>,
}

/// Load both category files and the seed pool and combine them.
#[instrument(level = "info", skip_all, fields(data_dir = %store.data_dir().display()))]
pub async fn list_resources(store: &ResourceStore) -> ResourceListing {
    let blogs = store.read_collection(Category::BlogPosts).await;
    let repos = store.read_collection(Category::GithubRepos).await;
    let seed = store.read_existing_resources().await;

    let resources = combine_listing(blogs, repos, seed);
    info!(count = resources.len(), "Listed resources");
    ResourceListing { resources }
}

/// Concatenate every source with its display type forced, then keep the
/// first record per url.
///
/// Order: blog posts, GitHub repos, seeded programs, seeded blog posts,
/// seeded job listings.
pub fn combine_listing(
    blogs: Vec<Resource>,
    repos: Vec<Resource>,
    seed: DevRelResources,
) -> Vec<Resource> {
    let DevRelResources {
        github_programs,
        blog_posts,
        job_listings,
    } = seed;

    blogs
        .into_iter()
        .map(with_type(Category::BlogPosts.resource_type()))
        .chain(repos.into_iter().map(with_type(Category::GithubRepos.resource_type())))
        .chain(github_programs.into_iter().map(seeded_program))
        .chain(blog_posts.into_iter().map(with_type(Category::BlogPosts.resource_type())))
        .chain(job_listings.into_iter().map(with_type(JOB_LISTING)))
        .unique_by(|resource| resource.url.clone())
        .collect()
}

fn with_type(kind: &'static str) -> impl Fn(Resource) -> Resource {
    move |mut resource| {
        resource.kind = kind.to_string();
        resource
    }
}

// Seeded programs prefer their `name` over `title` and always carry a description.
fn seeded_program(mut program: Resource) -> Resource {
    program.kind = GITHUB_PROGRAM.to_string();
    if let Some(name) = program
        .extra
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
    {
        program.title = clean_html(name);
    }
    program.description.get_or_insert_with(String::new);
    program
}
