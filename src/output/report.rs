//! Outcome types reported by the crawler

use crate::output::PageArtifact;
use crate::PagerError;
use std::fmt;
use std::path::PathBuf;

/// Why a category stopped paginating
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Every page up to the budget was requested
    PageLimit { max_pages: u32 },

    /// A later page came back below the size threshold and was discarded
    SmallPage { page: u32, bytes: u64 },

    /// The stop predicate asked to stop after this page
    Predicate { page: u32, mode: String },

    /// The stop predicate failed and the failure policy stopped pagination
    PredicateFailed { page: u32, error: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageLimit { max_pages } => write!(f, "reached page limit ({})", max_pages),
            Self::SmallPage { page, bytes } => {
                write!(f, "page {} too small ({} bytes)", page, bytes)
            }
            Self::Predicate { page, mode } => {
                write!(f, "stop predicate '{}' fired on page {}", mode, page)
            }
            Self::PredicateFailed { page, error } => {
                write!(f, "stop predicate failed on page {}: {}", page, error)
            }
        }
    }
}

/// Result of paginating one category
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub name: String,
    pub base_url: String,
    /// Kept artifacts, in page order
    pub artifacts: Vec<PageArtifact>,
    /// Every URL requested, in order
    pub requested: Vec<String>,
    pub stop: StopReason,
}

/// Result of scraping one retailer
#[derive(Debug, Clone)]
pub struct RetailerReport {
    pub id: String,
    pub name: String,
    pub categories: Vec<CategoryOutcome>,
}

impl RetailerReport {
    /// Number of kept pages across all categories
    pub fn pages_scraped(&self) -> usize {
        self.categories.iter().map(|c| c.artifacts.len()).sum()
    }

    /// Artifact paths in category then page order
    pub fn artifact_paths(&self) -> impl Iterator<Item = &PathBuf> + '_ {
        self.categories
            .iter()
            .flat_map(|c| c.artifacts.iter().map(|a| &a.path))
    }
}

/// A retailer that could not be scraped
#[derive(Debug)]
pub struct RetailerFailure {
    pub id: String,
    pub error: PagerError,
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct RunReport {
    /// Artifact paths in production order
    pub artifacts: Vec<PathBuf>,
    pub retailers: Vec<RetailerReport>,
    pub skipped: Vec<String>,
    pub failures: Vec<RetailerFailure>,
}

impl RunReport {
    /// Adds a retailer's artifacts to the run output
    pub fn push_retailer(&mut self, report: RetailerReport) {
        self.artifacts.extend(report.artifact_paths().cloned());
        self.retailers.push(report);
    }

    /// Adds a single-URL artifact to the run output
    pub fn push_artifact(&mut self, artifact: &PageArtifact) {
        self.artifacts.push(artifact.path.clone());
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
