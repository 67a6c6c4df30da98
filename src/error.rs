// --- Error Types ---

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures reported by a browser driver session.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid values in the configuration surface.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("result ceiling must be greater than zero")]
    ZeroCeiling,
    #[error("search term must not be empty")]
    EmptySearchTerm,
    #[error("price bounds must be non-negative")]
    NegativePrice,
    #[error("price range is inverted: min {min} > max {max}")]
    InvertedPriceRange { min: f64, max: f64 },
    #[error("invalid marketplace URL {0:?}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Navigation stage in which a fatal driver error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    Searching,
    PageReady,
    Advancing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Initializing => "opening marketplace",
            Stage::Searching => "submitting search",
            Stage::PageReady => "waiting for listing page",
            Stage::Advancing => "advancing to next page",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("navigation failed while {stage}: {source}")]
    Navigation {
        stage: Stage,
        #[source]
        source: DriverError,
    },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl ScraperError {
    pub fn navigation(stage: Stage, source: DriverError) -> Self {
        ScraperError::Navigation { stage, source }
    }
}
