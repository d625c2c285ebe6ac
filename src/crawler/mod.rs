//! Crawler module for paginated sale listings
//!
//! This module contains the core scraping logic, including:
//! - The scrape provider adapter ([`PageFetcher`])
//! - Stop predicates deciding when a category ends ([`StopPredicate`])
//! - The per-category page loop ([`PaginationController`])
//! - Per-retailer and per-run orchestration

mod coordinator;
mod fetcher;
mod pagination;
mod predicate;
mod retailer;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{run_scrape, Coordinator, CrawlContext, RunMode};
pub use fetcher::{build_http_client, FetchError, FetchRequest, PageFetcher, ScrapeApiFetcher};
pub use pagination::{PaginationController, MIN_PAGE_BYTES};
pub use predicate::{
    BuiltinPredicate, CommandPredicate, PredicateError, StopCheck, StopDecision, StopMode,
    StopPredicate,
};
pub use retailer::RetailerOrchestrator;
