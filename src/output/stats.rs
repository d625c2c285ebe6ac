//! Run statistics derived from a finished run report

use crate::output::{RetailerReport, RunReport, StopReason};
use std::time::Duration;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Retailers scraped without a configuration failure
    pub retailers_ok: usize,

    /// Retailers whose configuration could not be resolved
    pub retailers_failed: usize,

    /// Retailers skipped because they are disabled
    pub retailers_skipped: usize,

    pub categories: usize,

    /// Artifacts kept in the output
    pub pages_kept: usize,

    /// Kept artifacts whose fetch failed (recorded empty)
    pub failed_fetches: usize,

    pub bytes_saved: u64,

    /// Categories stopped by each rule
    pub stopped_by_limit: usize,
    pub stopped_by_size: usize,
    pub stopped_by_predicate: usize,
}

impl RunStatistics {
    /// Tallies a run report
    pub fn from_report(report: &RunReport) -> Self {
        let mut stats = Self {
            retailers_failed: report.failures.len(),
            retailers_skipped: report.skipped.len(),
            ..Self::default()
        };

        for retailer in &report.retailers {
            stats.add_retailer(retailer);
        }

        stats
    }

    fn add_retailer(&mut self, retailer: &RetailerReport) {
        self.retailers_ok += 1;
        self.categories += retailer.categories.len();

        for category in &retailer.categories {
            self.pages_kept += category.artifacts.len();
            self.failed_fetches += category.artifacts.iter().filter(|a| !a.success).count();
            self.bytes_saved += category.artifacts.iter().map(|a| a.byte_size).sum::<u64>();

            match category.stop {
                StopReason::PageLimit { .. } => self.stopped_by_limit += 1,
                StopReason::SmallPage { .. } => self.stopped_by_size += 1,
                StopReason::Predicate { .. } | StopReason::PredicateFailed { .. } => {
                    self.stopped_by_predicate += 1
                }
            }
        }
    }
}

/// Writes the run statistics to the diagnostic log
pub fn log_statistics(stats: &RunStatistics, elapsed: Duration) {
    tracing::info!(
        "Run finished in {:.1}s: {} retailers ok, {} failed, {} skipped",
        elapsed.as_secs_f64(),
        stats.retailers_ok,
        stats.retailers_failed,
        stats.retailers_skipped
    );
    tracing::info!(
        "{} categories, {} pages kept ({} bytes), {} failed fetches",
        stats.categories,
        stats.pages_kept,
        stats.bytes_saved,
        stats.failed_fetches
    );
    tracing::info!(
        "Stops: {} page limit, {} small page, {} predicate",
        stats.stopped_by_limit,
        stats.stopped_by_size,
        stats.stopped_by_predicate
    );
}
