// tests/common/mod.rs
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_scrap_meli::config::{Marketplace, OutputConfig, RunConfig, SearchConfig};
use rust_scrap_meli::driver::BrowserDriver;
use rust_scrap_meli::error::DriverError;
use rust_scrap_meli::selectors::{ITEM_CONTAINER, NEXT_BUTTON, SEARCH_BUTTON, SEARCH_INPUT};

pub const RESULTS_URL: &str = "https://listado.mercadolibre.com.ar/zapatillas-nike?sb=all";

/// Everything the scripted browser was asked to do.
#[derive(Debug, Default)]
pub struct Calls {
    pub opened: Vec<String>,
    pub typed: Vec<(String, String)>,
    pub clicked: Vec<String>,
    pub waited: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub closed: bool,
}

impl Calls {
    pub fn page_waits(&self) -> usize {
        self.waited.iter().filter(|s| *s == ITEM_CONTAINER).count()
    }

    pub fn screenshot_names(&self) -> Vec<String> {
        self.screenshots
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

/// In-memory browser serving a fixed list of listing pages.
///
/// The search button lands on the first page; every next-page click moves
/// one page forward.
pub struct ScriptedDriver {
    pages: Vec<String>,
    page: usize,
    url: String,
    calls: Arc<Mutex<Calls>>,
    fail_filter: bool,
    missing_search_input: bool,
    missing_items: bool,
    fail_screenshots: bool,
}

impl ScriptedDriver {
    pub fn new(pages: Vec<String>) -> (Self, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let driver = Self {
            pages,
            page: 0,
            url: "about:blank".to_string(),
            calls: Arc::clone(&calls),
            fail_filter: false,
            missing_search_input: false,
            missing_items: false,
            fail_screenshots: false,
        };
        (driver, calls)
    }

    /// Any URL carrying a `price` query pair fails to load.
    pub fn failing_filter(mut self) -> Self {
        self.fail_filter = true;
        self
    }

    pub fn without_search_input(mut self) -> Self {
        self.missing_search_input = true;
        self
    }

    /// Listing pages never render their item containers.
    pub fn without_items(mut self) -> Self {
        self.missing_items = true;
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.fail_screenshots = true;
        self
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn open(&mut self, url: &str) -> Result<(), DriverError> {
        self.calls().opened.push(url.to_string());
        if self.fail_filter && url.contains("price=") {
            return Err(DriverError::Browser("net::ERR_CONNECTION_RESET".to_string()));
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.calls().typed.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), DriverError> {
        self.calls().clicked.push(selector.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.calls().waited.push(selector.to_string());
        let missing = (selector == SEARCH_INPUT && self.missing_search_input)
            || (selector == ITEM_CONTAINER && self.missing_items);
        if missing {
            return Err(DriverError::Timeout {
                what: selector.to_string(),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn wait_for_navigation(&mut self, _timeout: Duration) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click_and_wait_for_navigation(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.calls().clicked.push(selector.to_string());
        if selector == SEARCH_BUTTON {
            self.page = 0;
            self.url = RESULTS_URL.to_string();
        } else if selector == NEXT_BUTTON {
            self.page += 1;
            self.url = format!("{RESULTS_URL}&_Desde={}", self.page * 50 + 1);
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn content(&mut self) -> Result<String, DriverError> {
        Ok(self
            .pages
            .get(self.page)
            .or(self.pages.last())
            .cloned()
            .unwrap_or_default())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        self.calls().screenshots.push(path.to_path_buf());
        if self.fail_screenshots {
            return Err(DriverError::Io(io::Error::other("no space left on device")));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.calls().closed = true;
        Ok(())
    }
}

/// Run config writing into `dir`, with a short navigation timeout.
pub fn config(dir: &Path, ceiling: usize) -> RunConfig {
    let search = SearchConfig::new("zapatillas nike", ceiling, Marketplace::new("mla").unwrap())
        .unwrap()
        .with_output(OutputConfig {
            dir: dir.join("output"),
            base_name: "zapatillas".to_string(),
        });
    let mut config = RunConfig::new(search);
    config.headless = true;
    config.diagnostics.dir = dir.join("screenshots");
    config.nav_timeout = Duration::from_millis(50);
    config
}

/// Listing item in legacy markup with every field present.
pub fn item(title: &str, price: &str) -> String {
    format!(
        r#"<a class="ui-search-link" href="/p/{title}">
             <img class="ui-search-result-image__element" src="https://http2.mlstatic.com/{title}.webp">
           </a>
           <h2 class="ui-search-item__title">{title}</h2>
           <div class="price-tag-amount"><span class="price-tag-fraction">{price}</span></div>
           <p class="ui-search-item__shipping">Envío gratis</p>
           <p class="ui-search-official-store-label">Tienda oficial Nike</p>
           <span class="ui-search-reviews__rating-number">4.7</span>"#
    )
}

/// Listing item in card markup with only title, price and link.
pub fn bare_item(title: &str, price: &str) -> String {
    format!(
        r#"<a class="poly-component__title" href="https://articulo.mercadolibre.com.ar/{title}">{title}</a>
           <div class="poly-price__current"><span class="andes-money-amount__fraction">{price}</span></div>"#
    )
}

pub fn listing(items: &[String], has_next: bool) -> String {
    let items: String = items
        .iter()
        .map(|body| format!(r#"<li class="ui-search-layout__item">{body}</li>"#))
        .collect();
    let next = if has_next {
        r#"<li class="andes-pagination__button andes-pagination__button--next"><a href="?_Desde=51">Siguiente</a></li>"#
    } else {
        r#"<li class="andes-pagination__button andes-pagination__button--next andes-pagination__button--disabled"><a>Siguiente</a></li>"#
    };
    format!(
        r#"<html><body><section><ol class="ui-search-layout">{items}</ol></section><ul class="andes-pagination">{next}</ul></body></html>"#
    )
}

pub fn prices(results: &rust_scrap_meli::ResultSet) -> Vec<Option<f64>> {
    results.iter().map(|r| r.price_numeric.amount()).collect()
}
