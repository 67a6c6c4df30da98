use tracing::{Instrument, error, info, info_span, warn};

use crate::accumulator::ResultAccumulator;
use crate::config::RunConfig;
use crate::driver::{self, BrowserDriver};
use crate::error::ScraperError;
use crate::export::{self, Artifacts};
use crate::paginator::{PaginationReport, Paginator};
use crate::record::ResultSet;
use crate::report::{ReportBuilder, RunInfo, Summary};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub run: RunInfo,
    pub results: ResultSet,
    pub summary: Summary,
    pub pagination: PaginationReport,
    pub artifacts: Artifacts,
}

/// Owns the browser session and the in-progress results for one run.
pub struct ScrapeOrchestrator<D: BrowserDriver> {
    config: RunConfig,
    driver: D,
    run: RunInfo,
}

impl<D: BrowserDriver> ScrapeOrchestrator<D> {
    pub fn new(config: RunConfig, driver: D) -> Self {
        Self {
            config,
            driver,
            run: RunInfo::new(),
        }
    }

    pub fn with_run_info(mut self, run: RunInfo) -> Self {
        self.run = run;
        self
    }

    /// Scrapes, closes the browser, then exports.
    ///
    /// The driver is closed on every path. When pagination fails an error
    /// screenshot is attempted first (diagnostics permitting).
    pub async fn run(self) -> Result<ScrapeOutcome, ScraperError> {
        let span = info_span!("scrape", run_id = %self.run.id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> Result<ScrapeOutcome, ScraperError> {
        let search = &self.config.search;
        info!(
            term = %search.term,
            ceiling = search.ceiling,
            min = %search.price_range.render_min(),
            max = %search.price_range.render_max(),
            "Starting scrape"
        );

        if self.config.diagnostics.enabled {
            if let Err(e) = tokio::fs::create_dir_all(&self.config.diagnostics.dir).await {
                warn!(dir = %self.config.diagnostics.dir.display(), "Could not create screenshots directory: {e}");
            }
        }

        let mut accumulator = ResultAccumulator::new(self.config.search.ceiling);
        let scraped = Paginator::new(&self.config, &mut self.driver, &mut accumulator)
            .run()
            .await;

        if let Err(e) = &scraped {
            error!("Scrape failed: {e}");
            driver::capture(&mut self.driver, &self.config.diagnostics, "error.png").await;
        }
        match self.driver.close().await {
            Ok(()) => info!("Browser session closed"),
            Err(e) => warn!("Closing browser failed: {e}"),
        }
        let pagination = scraped?;
        if accumulator.is_empty() {
            warn!("No products found for this search");
        }

        let results = accumulator.finalize();
        let report = ReportBuilder::new(&results, &self.config.search);
        let summary = report.summary();
        let artifacts = export::write_all(&self.config.search.output, &report, &self.run)?;

        info!(
            products = summary.count,
            pages = pagination.pages_visited,
            stop = ?pagination.stop_reason,
            mean = %summary.mean_price,
            min = %summary.min_price,
            max = %summary.max_price,
            free_shipping = summary.free_shipping_count,
            "Scrape finished"
        );

        Ok(ScrapeOutcome {
            run: self.run,
            results,
            summary,
            pagination,
            artifacts,
        })
    }
}
