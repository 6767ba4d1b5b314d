//! Flat JSON file store for scraped resources.
//!
//! # Submodules
//!
//! - [`json`]: Reads and writes the per-category collections and runs the
//!   url-keyed merge
//! - [`seed`]: Reads the pre-seeded, manually curated resource file
//! - [`listing`]: Combines every store into the read-only listing view
//!
//! # File Layout
//!
//! ```text
//! data_dir/
//! ├── blog_posts.json        # blog_posts category, rewritten every run
//! ├── github_repos.json      # github_repos category, rewritten every run
//! └── devrel_resources.json  # pre-seeded pool, read-only
//! ```
//!
//! Each category file is read-then-written by a single merge call. There is
//! no locking; runs must not overlap.

use crate::models::Category;
use std::path::{Path, PathBuf};

pub mod json;
pub mod listing;
pub mod seed;

/// File name of the pre-seeded resource pool.
pub const SEED_FILE: &str = "devrel_resources.json";

/// Handle on the data directory holding the three JSON files.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    data_dir: PathBuf,
}

impl ResourceStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the flat file for `category`.
    pub fn collection_path(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.file_name())
    }

    /// Path of the pre-seeded resource file.
    pub fn seed_path(&self) -> PathBuf {
        self.data_dir.join(SEED_FILE)
    }
}
