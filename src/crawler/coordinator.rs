//! Run coordinator - top-level dispatch of a scrape run
//!
//! This module contains the entry point that:
//! - Builds the fetcher and stop predicate from the run settings
//! - Dispatches one of the four run modes
//! - Fans `all` runs out over retailers while keeping enumeration order
//! - Collects every produced artifact path into a [`RunReport`]

use crate::config::{
    PredicateErrorPolicy, RetailerStore, ScrapeOptions, Settings, DEFAULT_WAIT_FOR_MS,
};
use crate::crawler::{
    BuiltinPredicate, CommandPredicate, FetchRequest, PageFetcher, RetailerOrchestrator,
    ScrapeApiFetcher, StopPredicate,
};
use crate::output::{
    log_statistics, ArtifactLayout, PageArtifact, RetailerFailure, RetailerReport, RunReport,
    RunStatistics,
};
use crate::url::host_slug;
use crate::PagerError;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// What a run scrapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// One retailer by id
    Retailer(String),
    /// Every enabled retailer
    All,
    /// One URL with the main-content filter on
    Discovery(String),
    /// One product URL with the main-content filter off
    Product(String),
}

/// Collaborators shared by every level of a run
pub struct CrawlContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub predicate: Arc<dyn StopPredicate>,
    pub layout: ArtifactLayout,
    /// Prior-run reference file handed to the stop predicate
    pub prior_state: Option<PathBuf>,
    pub on_predicate_error: PredicateErrorPolicy,
}

impl CrawlContext {
    /// Builds the production collaborators from the run settings
    pub fn from_settings(settings: &Settings) -> Result<Self, PagerError> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(ScrapeApiFetcher::new(&settings.provider)?);

        let predicate: Arc<dyn StopPredicate> = match settings
            .predicate
            .command
            .as_deref()
            .and_then(CommandPredicate::new)
        {
            Some(command) => Arc::new(command),
            None => Arc::new(BuiltinPredicate::new(
                &settings.predicate.product_url_pattern,
            )?),
        };

        Ok(Self {
            fetcher,
            predicate,
            layout: ArtifactLayout::new(&settings.output.dir),
            prior_state: settings.predicate.latest_path.clone(),
            on_predicate_error: settings.predicate.on_error,
        })
    }
}

/// Outcome of one retailer within an `all` run
enum RetailerRun {
    Scraped(RetailerReport),
    Skipped,
    Failed(PagerError),
}

/// Main run coordinator structure
pub struct Coordinator {
    context: CrawlContext,
    store: RetailerStore,
    order: Vec<String>,
    max_concurrent: usize,
}

impl Coordinator {
    /// Creates a coordinator with production collaborators
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated run settings
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(PagerError)` - The HTTP client or predicate could not be built
    pub fn new(settings: &Settings) -> Result<Self, PagerError> {
        let context = CrawlContext::from_settings(settings)?;
        Ok(Self::with_context(context, settings))
    }

    /// Creates a coordinator around explicit collaborators
    pub fn with_context(context: CrawlContext, settings: &Settings) -> Self {
        Self {
            context,
            store: RetailerStore::new(&settings.retailers.dir),
            order: settings.retailers.order.clone(),
            max_concurrent: settings.run.max_concurrent_retailers.max(1),
        }
    }

    /// Runs one scrape
    ///
    /// Single-retailer runs fail with `ConfigNotFound` for unknown ids. `all`
    /// runs never stop early: per-retailer failures land in
    /// [`RunReport::failures`].
    pub async fn run(&self, mode: &RunMode) -> Result<RunReport, PagerError> {
        self.context.layout.prepare().await?;
        let started = Instant::now();
        let mut report = RunReport::default();

        match mode {
            RunMode::Retailer(id) => {
                let retailer = RetailerOrchestrator::new(&self.context, &self.store)
                    .run(id)
                    .await?;
                report.push_retailer(retailer);
            }
            RunMode::All => self.run_all(&mut report).await?,
            RunMode::Discovery(url) => {
                let artifact = self
                    .fetch_single(
                        "discovery",
                        url,
                        ScrapeOptions {
                            wait_for_ms: DEFAULT_WAIT_FOR_MS,
                            only_main_content: true,
                        },
                        self.context.layout.discovery_path(url),
                    )
                    .await;
                report.push_artifact(&artifact);
                return Ok(report);
            }
            RunMode::Product(url) => {
                let artifact = self
                    .fetch_single(
                        "product",
                        url,
                        ScrapeOptions {
                            wait_for_ms: DEFAULT_WAIT_FOR_MS,
                            only_main_content: false,
                        },
                        self.context.layout.product_path(url),
                    )
                    .await;
                report.push_artifact(&artifact);
                return Ok(report);
            }
        }

        log_statistics(&RunStatistics::from_report(&report), started.elapsed());
        Ok(report)
    }

    /// Scrapes every enabled retailer, isolating failures per retailer
    async fn run_all(&self, report: &mut RunReport) -> Result<(), PagerError> {
        let ids = self.store.enumerate(&self.order)?;
        tracing::info!(
            "Scraping {} retailers ({} at a time)",
            ids.len(),
            self.max_concurrent
        );

        // `buffered` yields in input order regardless of completion order
        let results: Vec<(String, RetailerRun)> = stream::iter(ids)
            .map(|id| async move {
                let result = self.run_one(&id).await;
                (id, result)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        for (id, result) in results {
            match result {
                RetailerRun::Scraped(retailer) => report.push_retailer(retailer),
                RetailerRun::Skipped => report.skipped.push(id),
                RetailerRun::Failed(error) => {
                    tracing::error!(retailer = %id, "Retailer failed: {}", error);
                    report.failures.push(RetailerFailure { id, error });
                }
            }
        }

        Ok(())
    }

    async fn run_one(&self, id: &str) -> RetailerRun {
        let config = match self.store.load(id) {
            Ok(config) => config,
            Err(e) => return RetailerRun::Failed(e),
        };

        if !config.enabled {
            tracing::info!(retailer = %id, "Skipping disabled retailer");
            return RetailerRun::Skipped;
        }

        let retailer = RetailerOrchestrator::new(&self.context, &self.store)
            .scrape(&config)
            .await;
        RetailerRun::Scraped(retailer)
    }

    /// Fetches one URL without pagination or stop predicate
    ///
    /// A failed fetch still yields exactly one (empty) artifact.
    async fn fetch_single(
        &self,
        mode: &str,
        url: &str,
        options: ScrapeOptions,
        path: PathBuf,
    ) -> PageArtifact {
        tracing::info!(mode, "Fetching {}", url);
        let request = FetchRequest::new(url, options);

        let (byte_size, success) = match self.context.fetcher.fetch(&request, &path).await {
            Ok(bytes) => {
                tracing::info!(mode, "Saved {} bytes to {}", bytes, path.display());
                (bytes, true)
            }
            Err(e) => {
                tracing::warn!(mode, "Fetch failed for {}: {}", url, e);
                if let Err(e) = tokio::fs::write(&path, b"").await {
                    tracing::warn!("Could not record empty artifact {}: {}", path.display(), e);
                }
                (0, false)
            }
        };

        PageArtifact {
            retailer: mode.to_string(),
            category: host_slug(url),
            page: 1,
            url: url.to_string(),
            path,
            byte_size,
            success,
        }
    }
}

/// Runs a complete scrape with production collaborators
///
/// This is the main entry point for a run. It will:
/// 1. Build the scrape provider client and stop predicate
/// 2. Dispatch the requested mode
/// 3. Return every produced artifact path in order
pub async fn run_scrape(settings: &Settings, mode: &RunMode) -> Result<RunReport, PagerError> {
    let coordinator = Coordinator::new(settings)?;
    coordinator.run(mode).await
}
