//! Per-category JSON collections and the url-keyed merge.
//!
//! # Merge Rules
//!
//! A save pass concatenates, in order:
//! 1. the previously persisted collection,
//! 2. the freshly scraped resources,
//! 3. the pre-seeded pool for the category,
//!
//! then keeps one record per `url`. On a conflict the record with the later
//! `added_at` wins and takes the slot of the one it replaces; the loser is
//! dropped whole, with no field-level merge.

use crate::models::{Category, Resource, SaveStats};
use crate::store::ResourceStore;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

impl ResourceStore {
    /// Load the persisted collection for `category`.
    ///
    /// A missing or unparseable file is treated as an empty collection.
    #[instrument(level = "debug", skip(self))]
    pub async fn read_collection(&self, category: Category) -> Vec<Resource> {
        let path = self.collection_path(category);
        match read_resource_array(&path).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable collection; starting fresh");
                Vec::new()
            }
        }
    }

    /// Merge `fresh` into the persisted collection for `category` and write it back.
    ///
    /// Returns the size of the merged set and its growth over the previously
    /// persisted set.
    ///
    /// # Errors
    ///
    /// Fails only if the merged collection cannot be serialized or written.
    #[instrument(level = "info", skip_all, fields(%category, fresh = fresh.len()))]
    pub async fn save_resources(
        &self,
        fresh: Vec<Resource>,
        category: Category,
    ) -> Result<SaveStats, Box<dyn Error>> {
        let existing = self.read_collection(category).await;
        let pool = self.read_existing_resources().await.into_pool(category);
        let previous = existing.len();

        let merged = merge_by_url(existing.into_iter().chain(fresh).chain(pool));
        let path = self.collection_path(category);
        write_resource_array(&path, &merged).await?;

        let stats = SaveStats {
            total: merged.len(),
            new: merged.len() as i64 - previous as i64,
        };
        info!(
            path = %path.display(),
            total = stats.total,
            new = stats.new,
            "Saved resources"
        );
        Ok(stats)
    }
}

/// Deduplicate by `url`, keeping the most recently added record per url.
///
/// Output order is the order in which each url was first seen. Records
/// with an empty url all share one key.
pub fn merge_by_url<I>(resources: I) -> Vec<Resource>
where
    I: IntoIterator<Item = Resource>,
{
    let mut merged: Vec<Resource> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for resource in resources {
        if resource.url.is_empty() {
            debug!(title = %resource.title, "Resource without url");
        }
        match slots.get(&resource.url) {
            Some(&slot) => {
                if resource.is_newer_than(&merged[slot]) {
                    merged[slot] = resource;
                }
            }
            None => {
                slots.insert(resource.url.clone(), merged.len());
                merged.push(resource);
            }
        }
    }

    merged
}

/// Read a JSON array of resource records.
///
/// Array elements that are not resource-shaped are skipped. A missing file
/// yields an empty list; any other read or parse failure is an error.
pub async fn read_resource_array(path: &Path) -> Result<Vec<Resource>, Box<dyn Error>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No file yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let values: Vec<Value> = serde_json::from_str(&content)?;
    Ok(values_to_resources(values))
}

/// Convert raw JSON values to resources, dropping the ones that do not fit.
pub fn values_to_resources(values: Vec<Value>) -> Vec<Resource> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Resource>(value) {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed resource record");
                None
            }
        })
        .collect()
}

/// Write resources as a JSON array pretty-printed with 2-space indentation.
pub async fn write_resource_array(
    path: &Path,
    resources: &[Resource],
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(resources)?;
    fs::write(path, json).await?;
    Ok(())
}
