//! Output module for run artifacts and reports
//!
//! This module handles:
//! - Naming and locating page artifacts
//! - Collecting per-category, per-retailer and per-run outcomes
//! - Emitting the artifact path list on the primary output channel

mod artifact;
mod report;
pub mod stats;

pub use artifact::{ArtifactLayout, PageArtifact};
pub use report::{CategoryOutcome, RetailerFailure, RetailerReport, RunReport, StopReason};
pub use stats::{log_statistics, RunStatistics};

use std::io::Write;
use std::path::PathBuf;

/// Writes artifact paths one per line
///
/// This is the only thing a run writes to its primary output, so downstream
/// tools can read the list without filtering progress messages.
///
/// # Arguments
///
/// * `writer` - Destination, normally stdout
/// * `paths` - Artifact paths in production order
pub fn write_paths<W: Write>(writer: &mut W, paths: &[PathBuf]) -> std::io::Result<()> {
    for path in paths {
        writeln!(writer, "{}", path.display())?;
    }
    writer.flush()
}
