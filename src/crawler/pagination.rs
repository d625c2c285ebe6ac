//! Pagination controller - the per-category page loop
//!
//! Pages are requested strictly in order. After each fetch two rules decide
//! whether the next page is requested at all:
//! - a page after the first that comes back under [`MIN_PAGE_BYTES`] is
//!   discarded and ends the category
//! - when the category names a stop mode, the stop predicate is consulted on
//!   the kept page and may end the category after it

use crate::config::{Category, PredicateErrorPolicy, ScrapeOptions};
use crate::crawler::{CrawlContext, FetchRequest, StopCheck, StopDecision};
use crate::output::{CategoryOutcome, PageArtifact, StopReason};
use crate::url::page_url;
use std::path::Path;

/// Pages smaller than this (after page 1) are treated as "no more listings"
pub const MIN_PAGE_BYTES: u64 = 500;

/// Drives the page loop of one category
pub struct PaginationController<'a> {
    context: &'a CrawlContext,
    retailer: &'a str,
    param: &'a str,
    options: ScrapeOptions,
}

impl<'a> PaginationController<'a> {
    /// Creates a controller for the categories of one retailer
    ///
    /// # Arguments
    ///
    /// * `context` - Shared fetcher, predicate and output layout
    /// * `retailer` - Retailer id used in artifact names
    /// * `param` - Query parameter carrying the page number
    /// * `options` - Scrape options forwarded with every fetch
    pub fn new(
        context: &'a CrawlContext,
        retailer: &'a str,
        param: &'a str,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            context,
            retailer,
            param,
            options,
        }
    }

    /// Paginates one category until its page budget or a stop rule ends it
    pub async fn run(&self, category: &Category) -> CategoryOutcome {
        let mut artifacts = Vec::new();
        let mut requested = Vec::new();

        for page in 1..=category.max_pages {
            let url = page_url(&category.base_url, self.param, page);
            let path = self
                .context
                .layout
                .page_path(self.retailer, &category.file_stem, page);
            requested.push(url.clone());

            tracing::info!(
                retailer = self.retailer,
                category = %category.name,
                page,
                "Fetching {}",
                url
            );

            let request = FetchRequest::new(url.clone(), self.options);
            let (byte_size, success) = match self.context.fetcher.fetch(&request, &path).await {
                Ok(bytes) => {
                    tracing::info!(
                        retailer = self.retailer,
                        category = %category.name,
                        page,
                        "Saved {} bytes to {}",
                        bytes,
                        path.display()
                    );
                    (bytes, true)
                }
                Err(e) => {
                    tracing::warn!(
                        retailer = self.retailer,
                        category = %category.name,
                        page,
                        "Fetch failed for {}: {}",
                        url,
                        e
                    );
                    record_empty(&path).await;
                    (0, false)
                }
            };

            if page > 1 && byte_size < MIN_PAGE_BYTES {
                discard(&path).await;
                tracing::info!(
                    retailer = self.retailer,
                    category = %category.name,
                    page,
                    "Page has only {} bytes, no more listings",
                    byte_size
                );
                return finish(
                    category,
                    artifacts,
                    requested,
                    StopReason::SmallPage {
                        page,
                        bytes: byte_size,
                    },
                );
            }

            artifacts.push(PageArtifact {
                retailer: self.retailer.to_string(),
                category: category.name.clone(),
                page,
                url,
                path: path.clone(),
                byte_size,
                success,
            });

            if let Some(stop) = self.check_stop(category, page, &path).await {
                return finish(category, artifacts, requested, stop);
            }
        }

        finish(
            category,
            artifacts,
            requested,
            StopReason::PageLimit {
                max_pages: category.max_pages,
            },
        )
    }

    /// Consults the stop predicate for a kept page, if the category has one
    async fn check_stop(&self, category: &Category, page: u32, path: &Path) -> Option<StopReason> {
        let mode = category.stop_when.as_ref()?;
        let check = StopCheck {
            mode,
            artifact: path,
            prior_state: self.context.prior_state.as_deref(),
            threshold: category.threshold,
        };

        match self.context.predicate.evaluate(&check).await {
            Ok(StopDecision::Continue) => None,
            Ok(StopDecision::Stop) => {
                tracing::info!(
                    retailer = self.retailer,
                    category = %category.name,
                    page,
                    "Stop predicate '{}' ended pagination",
                    mode
                );
                Some(StopReason::Predicate {
                    page,
                    mode: mode.to_string(),
                })
            }
            Err(e) => match self.context.on_predicate_error {
                PredicateErrorPolicy::Stop => {
                    tracing::warn!(
                        retailer = self.retailer,
                        category = %category.name,
                        page,
                        "Stop predicate '{}' failed, stopping: {}",
                        mode,
                        e
                    );
                    Some(StopReason::PredicateFailed {
                        page,
                        error: e.to_string(),
                    })
                }
                PredicateErrorPolicy::Continue => {
                    tracing::warn!(
                        retailer = self.retailer,
                        category = %category.name,
                        page,
                        "Stop predicate '{}' failed, continuing: {}",
                        mode,
                        e
                    );
                    None
                }
            },
        }
    }
}

fn finish(
    category: &Category,
    artifacts: Vec<PageArtifact>,
    requested: Vec<String>,
    stop: StopReason,
) -> CategoryOutcome {
    CategoryOutcome {
        name: category.name.clone(),
        base_url: category.base_url.clone(),
        artifacts,
        requested,
        stop,
    }
}

/// Leaves an empty file behind for a failed fetch
async fn record_empty(path: &Path) {
    if let Err(e) = tokio::fs::write(path, b"").await {
        tracing::warn!("Could not record empty artifact {}: {}", path.display(), e);
    }
}

/// Removes a page that will not be reported
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}
