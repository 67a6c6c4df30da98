//! Run configuration.
//!
//! Every value comes from the environment (optionally seeded from a `.env`
//! file) and is validated once into immutable structs that the rest of the
//! crate borrows.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_COUNTRY_CODE: &str = "mla";
pub const DEFAULT_SEARCH_TERM: &str = "zapatillas nike";
pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_OUTPUT_FILENAME: &str = "nike_zapatillas";
pub const DEFAULT_SCREENSHOTS_DIR: &str = "./screenshots";
pub const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FREE_SHIPPING_TERM: &str = "gratis";
pub const DEFAULT_PRICE_FILTER_TEMPLATE: &str = "price={min}-{max}";

/// Locale conventions and URL shape of one marketplace site.
#[derive(Debug, Clone, PartialEq)]
pub struct Marketplace {
    pub code: String,
    pub base_url: Url,
    pub decimal_separator: char,
    pub thousands_separator: char,
    /// Term whose presence in the shipping label marks free shipping.
    pub free_shipping_term: String,
    /// Query pair appended to the results URL, with `{min}` / `{max}` holes.
    pub price_filter_template: String,
}

impl Marketplace {
    pub fn new(code: &str) -> Result<Self, ConfigError> {
        let raw = format!("https://{}.mercadolibre.com", code.trim().to_lowercase());
        let base_url = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(raw))?;
        Ok(Self {
            code: code.trim().to_lowercase(),
            base_url,
            decimal_separator: ',',
            thousands_separator: '.',
            free_shipping_term: DEFAULT_FREE_SHIPPING_TERM.to_string(),
            price_filter_template: DEFAULT_PRICE_FILTER_TEMPLATE.to_string(),
        })
    }

    /// Renders the price filter as a single `(key, value)` query pair.
    ///
    /// Returns `None` when the range is open on both ends or the template has
    /// no `key=value` shape.
    pub fn price_filter_pair(&self, range: &PriceRange) -> Option<(String, String)> {
        if range.is_open() {
            return None;
        }
        let rendered = self
            .price_filter_template
            .replace("{min}", &range.render_min())
            .replace("{max}", &range.render_max());
        let (key, value) = rendered.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }
}

/// Inclusive price bounds; `None` means open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Result<Self, ConfigError> {
        if min.is_some_and(|v| v < 0.0) || max.is_some_and(|v| v < 0.0) {
            return Err(ConfigError::NegativePrice);
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ConfigError::InvertedPriceRange { min, max });
            }
        }
        Ok(Self { min, max })
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn render_min(&self) -> String {
        render_bound(self.min)
    }

    pub fn render_max(&self) -> String {
        render_bound(self.max)
    }
}

fn render_bound(bound: Option<f64>) -> String {
    match bound {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => v.to_string(),
        None => "*".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub base_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_name: DEFAULT_OUTPUT_FILENAME.to_string(),
        }
    }
}

/// What to search for and how much of it to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub term: String,
    pub ceiling: usize,
    pub price_range: PriceRange,
    pub marketplace: Marketplace,
    pub output: OutputConfig,
}

impl SearchConfig {
    pub fn new(
        term: impl Into<String>,
        ceiling: usize,
        marketplace: Marketplace,
    ) -> Result<Self, ConfigError> {
        let term = term.into().trim().to_string();
        if term.is_empty() {
            return Err(ConfigError::EmptySearchTerm);
        }
        if ceiling == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        Ok(Self {
            term,
            ceiling,
            price_range: PriceRange::default(),
            marketplace,
            output: OutputConfig::default(),
        })
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = range;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from(DEFAULT_SCREENSHOTS_DIR),
        }
    }
}

/// Everything one run needs: the search plus browser-side knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub search: SearchConfig,
    pub headless: bool,
    pub diagnostics: Diagnostics,
    pub nav_timeout: Duration,
}

impl RunConfig {
    pub fn new(search: SearchConfig) -> Self {
        Self {
            search,
            headless: false,
            diagnostics: Diagnostics::default(),
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
        }
    }

    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let code = get("COUNTRY_CODE").unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
        let mut marketplace = Marketplace::new(&code)?;
        if let Some(raw) = get("MARKETPLACE_URL") {
            marketplace.base_url = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(raw))?;
        }
        if let Some(term) = get("FREE_SHIPPING_TERM") {
            marketplace.free_shipping_term = term;
        }
        if let Some(template) = get("PRICE_FILTER_TEMPLATE") {
            marketplace.price_filter_template = template;
        }

        let term = get("SEARCH_TERM").unwrap_or_else(|| DEFAULT_SEARCH_TERM.to_string());
        let ceiling = match get("MAX_RESULTS") {
            Some(raw) => parse_number::<usize>("MAX_RESULTS", &raw)?,
            None => DEFAULT_MAX_RESULTS,
        };
        let min = get("PRICE_MIN").map(|raw| parse_number::<f64>("PRICE_MIN", &raw)).transpose()?;
        let max = get("PRICE_MAX").map(|raw| parse_number::<f64>("PRICE_MAX", &raw)).transpose()?;

        let output = OutputConfig {
            dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_name: get("OUTPUT_FILENAME").unwrap_or_else(|| DEFAULT_OUTPUT_FILENAME.to_string()),
        };

        let search = SearchConfig::new(term, ceiling, marketplace)?
            .with_price_range(PriceRange::new(min, max)?)
            .with_output(output);

        let nav_timeout = match get("NAV_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("NAV_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
        };

        Ok(Self {
            search,
            headless: get("HEADLESS").as_deref() == Some("true"),
            diagnostics: Diagnostics {
                enabled: get("SAVE_SCREENSHOTS").as_deref() == Some("true"),
                dir: get("SCREENSHOTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SCREENSHOTS_DIR)),
            },
            nav_timeout,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}
