//! Navigation state machine.
//!
//! ```text
//! Initializing -> Searching -> [FilterApplying] -> PageReady -> Advancing -> PageReady ... -> Done
//!                                   any state --fatal driver error--> Failed
//! ```
//!
//! Termination is checked once per completed page: the ceiling first, then
//! the presence of an enabled next control.

use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::accumulator::ResultAccumulator;
use crate::config::RunConfig;
use crate::driver::{self, BrowserDriver};
use crate::error::{DriverError, ScraperError, Stage};
use crate::extractor::{RecordExtractor, has_next_page};
use crate::record::ProductRecord;
use crate::selectors::{ITEM_CONTAINER, NEXT_BUTTON, SEARCH_BUTTON, SEARCH_INPUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    Initializing,
    Searching,
    FilterApplying,
    PageReady { page: usize },
    Advancing { page: usize },
    Done(StopReason),
    Failed,
}

impl PaginatorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaginatorState::Done(_) | PaginatorState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CeilingReached,
    Exhausted,
}

/// State that follows a completed page.
///
/// The ceiling wins over pagination: once enough records are in, remaining
/// pages are never visited.
pub fn after_page(page: usize, collected: usize, ceiling: usize) -> PaginatorState {
    if collected >= ceiling {
        PaginatorState::Done(StopReason::CeilingReached)
    } else {
        PaginatorState::Advancing { page }
    }
}

/// State that follows an `Advancing` check.
pub fn after_advance(page: usize, has_next: bool) -> PaginatorState {
    if has_next {
        PaginatorState::PageReady { page: page + 1 }
    } else {
        PaginatorState::Done(StopReason::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationReport {
    pub pages_visited: usize,
    pub stop_reason: StopReason,
    pub filter_applied: bool,
}

pub struct Paginator<'a, D: BrowserDriver> {
    config: &'a RunConfig,
    driver: &'a mut D,
    accumulator: &'a mut ResultAccumulator,
    state: PaginatorState,
    next_available: bool,
    pages_visited: usize,
    filter_applied: bool,
}

impl<'a, D: BrowserDriver> Paginator<'a, D> {
    pub fn new(config: &'a RunConfig, driver: &'a mut D, accumulator: &'a mut ResultAccumulator) -> Self {
        Self {
            config,
            driver,
            accumulator,
            state: PaginatorState::Initializing,
            next_available: false,
            pages_visited: 0,
            filter_applied: false,
        }
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Steps until `Done`, or returns the fatal error that moved the machine to `Failed`.
    pub async fn run(mut self) -> Result<PaginationReport, ScraperError> {
        loop {
            if let PaginatorState::Done(stop_reason) = self.step().await? {
                return Ok(PaginationReport {
                    pages_visited: self.pages_visited,
                    stop_reason,
                    filter_applied: self.filter_applied,
                });
            }
        }
    }

    /// Performs one transition. Terminal states are absorbing.
    pub async fn step(&mut self) -> Result<PaginatorState, ScraperError> {
        let next = match self.state {
            PaginatorState::Done(_) | PaginatorState::Failed => return Ok(self.state),
            PaginatorState::Initializing => self.initialize().await,
            PaginatorState::Searching => self.search().await,
            PaginatorState::FilterApplying => {
                self.apply_price_filter().await;
                Ok(PaginatorState::PageReady { page: 1 })
            }
            PaginatorState::PageReady { page } => self.process_page(page).await,
            PaginatorState::Advancing { page } => self.advance(page).await,
        };
        match next {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                self.state = PaginatorState::Failed;
                Err(e)
            }
        }
    }

    async fn initialize(&mut self) -> Result<PaginatorState, ScraperError> {
        let base_url = self.config.search.marketplace.base_url.as_str();
        info!(url = base_url, "Opening marketplace");
        self.driver
            .open(base_url)
            .await
            .map_err(|e| ScraperError::navigation(Stage::Initializing, e))?;
        driver::capture(&mut *self.driver, &self.config.diagnostics, "01-homepage.png").await;
        Ok(PaginatorState::Searching)
    }

    async fn search(&mut self) -> Result<PaginatorState, ScraperError> {
        let config = self.config;
        let timeout = config.nav_timeout;
        info!(term = %config.search.term, "Searching");
        let session = &mut *self.driver;
        let searched: Result<(), DriverError> = async {
            session.wait_for(SEARCH_INPUT, timeout).await?;
            session.type_text(SEARCH_INPUT, &config.search.term).await?;
            session.click_and_wait_for_navigation(SEARCH_BUTTON, timeout).await
        }
        .await;
        searched.map_err(|e| ScraperError::navigation(Stage::Searching, e))?;
        driver::capture(&mut *self.driver, &config.diagnostics, "02-search-results.png").await;

        let search = &config.search;
        if search.marketplace.price_filter_pair(&search.price_range).is_some() {
            Ok(PaginatorState::FilterApplying)
        } else {
            Ok(PaginatorState::PageReady { page: 1 })
        }
    }

    /// Best effort: any failure leaves the unfiltered results in place.
    async fn apply_price_filter(&mut self) {
        let config = self.config;
        let search = &config.search;
        let Some((key, value)) = search.marketplace.price_filter_pair(&search.price_range) else {
            return;
        };
        info!(
            min = %search.price_range.render_min(),
            max = %search.price_range.render_max(),
            "Applying price filter"
        );

        let unfiltered = match self.driver.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Price filter skipped, current URL unavailable: {e}");
                return;
            }
        };
        let mut filtered = match Url::parse(&unfiltered) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %unfiltered, "Price filter skipped, unparsable URL: {e}");
                return;
            }
        };
        filtered.query_pairs_mut().append_pair(&key, &value);

        match self.driver.open(filtered.as_str()).await {
            Ok(()) => {
                self.filter_applied = true;
                driver::capture(&mut *self.driver, &config.diagnostics, "03-price-filtered.png").await;
            }
            Err(e) => {
                warn!(url = %filtered, "Price filter failed, continuing unfiltered: {e}");
                if let Err(e) = self.driver.open(&unfiltered).await {
                    warn!(url = %unfiltered, "Could not reopen unfiltered results: {e}");
                }
            }
        }
    }

    async fn process_page(&mut self, page: usize) -> Result<PaginatorState, ScraperError> {
        info!(page, "Processing page");
        let fatal = |e| ScraperError::navigation(Stage::PageReady, e);

        self.driver
            .wait_for(ITEM_CONTAINER, self.config.nav_timeout)
            .await
            .map_err(fatal)?;
        let html = self.driver.content().await.map_err(fatal)?;
        let page_url = self.driver.current_url().await.ok();

        let extractor = RecordExtractor::new(&self.config.search.marketplace);
        let extractor = match &page_url {
            Some(url) => extractor.with_page_url(url),
            None => extractor,
        };
        let (records, has_next) = read_page(&extractor, &html);
        info!(page, found = records.len(), "Extracted products");

        self.accumulator.append(records);
        self.next_available = has_next;
        self.pages_visited = page;
        driver::capture(&mut *self.driver, &self.config.diagnostics, &format!("page-{page}.png")).await;

        let state = after_page(page, self.accumulator.len(), self.config.search.ceiling);
        if let PaginatorState::Done(_) = state {
            info!(ceiling = self.config.search.ceiling, "Result limit reached");
        }
        Ok(state)
    }

    async fn advance(&mut self, page: usize) -> Result<PaginatorState, ScraperError> {
        let state = after_advance(page, self.next_available);
        match state {
            PaginatorState::PageReady { .. } => {
                info!("Navigating to next page");
                self.driver
                    .click_and_wait_for_navigation(NEXT_BUTTON, self.config.nav_timeout)
                    .await
                    .map_err(|e| ScraperError::navigation(Stage::Advancing, e))?;
            }
            _ => info!("No more pages available"),
        }
        Ok(state)
    }
}

/// Parses the snapshot and extracts records plus the next-page signal.
///
/// Kept synchronous so the parsed DOM never lives across an await.
fn read_page(extractor: &RecordExtractor<'_>, html: &str) -> (Vec<ProductRecord>, bool) {
    let document = Html::parse_document(html);
    let records = extractor.extract(&document);
    let has_next = has_next_page(&document);
    debug!(has_next, "Parsed listing page");
    (records, has_next)
}
