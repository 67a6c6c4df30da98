// src/lib.rs

//! MercadoLibre search scraper.
//!
//! Drives one browser session through a search, walks the paginated results
//! until the result ceiling or the last page, and exports the cheapest-first
//! listing as CSV, JSON and an HTML report.

pub mod accumulator;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod extractor;
pub mod orchestrator;
pub mod paginator;
pub mod price;
pub mod record;
pub mod report;
pub mod selectors;

pub use accumulator::ResultAccumulator;
pub use config::{Marketplace, PriceRange, RunConfig, SearchConfig};
pub use driver::{BrowserDriver, ChromiumDriver};
pub use error::{ConfigError, DriverError, ExportError, ScraperError};
pub use orchestrator::{ScrapeOrchestrator, ScrapeOutcome};
pub use price::{Price, parse_price};
pub use record::{ProductRecord, ResultSet};
pub use report::{ReportBuilder, Summary};

/// Loads configuration from the environment, launches Chrome and runs one scrape.
pub async fn run_scraper() -> Result<ScrapeOutcome, ScraperError> {
    let config = RunConfig::from_env()?;
    let driver = ChromiumDriver::launch(config.headless)
        .await
        .map_err(|e| ScraperError::navigation(error::Stage::Initializing, e))?;
    ScrapeOrchestrator::new(config, driver).run().await
}
