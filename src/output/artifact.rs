//! Page artifacts and where they are written

use crate::url::{host_slug, last_segment, slugify};
use std::path::{Path, PathBuf};

/// Extension of every saved page
const ARTIFACT_EXTENSION: &str = "md";

/// The saved content of one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArtifact {
    /// Retailer id, or the single-URL mode name
    pub retailer: String,
    pub category: String,
    /// 1-based page number
    pub page: u32,
    pub url: String,
    pub path: PathBuf,
    pub byte_size: u64,
    /// False when the fetch failed and an empty artifact was recorded
    pub success: bool,
}

/// Naming scheme for artifacts under the output directory
///
/// Paths are keyed by retailer, category and page number only, so two runs
/// sharing an output directory overwrite each other's files.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the output directory if needed
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// `<dir>/<retailer>_<category>_p<page>.md`
    pub fn page_path(&self, retailer: &str, category: &str, page: u32) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_p{}.{}",
            slugify(retailer),
            slugify(category),
            page,
            ARTIFACT_EXTENSION
        ))
    }

    /// `<dir>/discovery_<host>.md`
    pub fn discovery_path(&self, url: &str) -> PathBuf {
        self.dir
            .join(format!("discovery_{}.{}", host_slug(url), ARTIFACT_EXTENSION))
    }

    /// `<dir>/product_<host>_<last path segment>.md`
    pub fn product_path(&self, url: &str) -> PathBuf {
        let segment = last_segment(url).unwrap_or_else(|| "index".to_string());
        self.dir.join(format!(
            "product_{}_{}.{}",
            host_slug(url),
            slugify(&segment),
            ARTIFACT_EXTENSION
        ))
    }
}
