//! Retailer orchestrator - walks every category of one retailer

use crate::config::{RetailerConfig, RetailerStore};
use crate::crawler::{CrawlContext, PaginationController};
use crate::output::RetailerReport;

/// Scrapes the categories of one retailer in `sale-urls` order
pub struct RetailerOrchestrator<'a> {
    context: &'a CrawlContext,
    store: &'a RetailerStore,
}

impl<'a> RetailerOrchestrator<'a> {
    pub fn new(context: &'a CrawlContext, store: &'a RetailerStore) -> Self {
        Self { context, store }
    }

    /// Loads a retailer's configuration and scrapes it
    ///
    /// # Returns
    ///
    /// * `Ok(RetailerReport)` - All categories were walked (some may be empty)
    /// * `Err(PagerError::ConfigNotFound)` - No configuration for `id`
    /// * `Err(PagerError::Config)` - The configuration could not be read
    pub async fn run(&self, id: &str) -> crate::Result<RetailerReport> {
        let config = self.store.load(id)?;
        Ok(self.scrape(&config).await)
    }

    /// Scrapes an already loaded retailer
    pub async fn scrape(&self, config: &RetailerConfig) -> RetailerReport {
        let categories = config.categories();
        tracing::info!(
            retailer = %config.id,
            "Scraping {} ({} categories)",
            config.name,
            categories.len()
        );

        let controller = PaginationController::new(
            self.context,
            &config.id,
            &config.pagination.param,
            config.scrape_options,
        );

        let mut outcomes = Vec::with_capacity(categories.len());
        for category in &categories {
            tracing::info!(
                retailer = %config.id,
                category = %category.name,
                "Category {}/{}: up to {} pages from {}",
                category.index + 1,
                categories.len(),
                category.max_pages,
                category.base_url
            );

            let outcome = controller.run(category).await;

            if outcome.artifacts.is_empty() {
                tracing::warn!(
                    retailer = %config.id,
                    category = %category.name,
                    "Category produced no pages"
                );
            }
            tracing::info!(
                retailer = %config.id,
                category = %category.name,
                "Kept {} pages, {}",
                outcome.artifacts.len(),
                outcome.stop
            );
            outcomes.push(outcome);
        }

        let report = RetailerReport {
            id: config.id.clone(),
            name: config.name.clone(),
            categories: outcomes,
        };

        tracing::info!(
            retailer = %config.id,
            "{}: {} categories, {} pages scraped",
            report.name,
            report.categories.len(),
            report.pages_scraped()
        );

        report
    }
}
