use std::process::ExitCode;
use std::time::Instant;

use chrono::Local;
use rust_scrap_meli::run_scraper;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("{}", "=".repeat(80));
    info!("MERCADOLIBRE SCRAPER");
    info!("{}", "=".repeat(80));
    info!("Started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let start = Instant::now();
    match run_scraper().await {
        Ok(outcome) => {
            info!("{}", "=".repeat(80));
            info!("Scraping completed: {} products", outcome.summary.count);
            info!("Total time: {:.2} seconds", start.elapsed().as_secs_f64());
            info!("{}", "=".repeat(80));
            ExitCode::SUCCESS
        }
        Err(e) => {
            // an error occurred during scraping; exit non-zero
            error!("An error occurred during scraping: {e}");
            ExitCode::FAILURE
        }
    }
}
