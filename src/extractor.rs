//! Page snapshot → product records.
//!
//! Pure mapping over an already rendered page: no navigation, no I/O. Every
//! field resolves on its own, so a missing element only ever costs that
//! field its fallback value.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::Marketplace;
use crate::price::{parse_price, parse_rating};
use crate::record::{NO_TITLE, PRICE_UNAVAILABLE, ProductRecord, STANDARD_SELLER};
use crate::selectors;

pub struct RecordExtractor<'a> {
    marketplace: &'a Marketplace,
    page_url: Option<Url>,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(marketplace: &'a Marketplace) -> Self {
        Self {
            marketplace,
            page_url: None,
        }
    }

    /// Relative links and image sources resolve against this URL.
    pub fn with_page_url(mut self, page_url: &str) -> Self {
        self.page_url = Url::parse(page_url).ok();
        self
    }

    /// One record per item container, in document order.
    pub fn extract(&self, document: &Html) -> Vec<ProductRecord> {
        document
            .select(&selectors::ITEM)
            .map(|item| self.extract_item(item))
            .collect()
    }

    pub fn extract_item(&self, item: ElementRef<'_>) -> ProductRecord {
        let title = first_match(item, &selectors::TITLE)
            .map(text_of)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let fraction = first_match(item, &selectors::PRICE_FRACTION)
            .map(text_of)
            .filter(|t| !t.is_empty());
        let cents = first_match(item, &selectors::PRICE_CENTS)
            .map(text_of)
            .filter(|t| !t.is_empty());
        let (price_display, price_numeric) = match &fraction {
            Some(fraction) => (
                self.display_price(fraction, cents.as_deref()),
                parse_price(fraction, cents.as_deref(), self.marketplace),
            ),
            None => (
                PRICE_UNAVAILABLE.to_string(),
                parse_price(PRICE_UNAVAILABLE, None, self.marketplace),
            ),
        };

        let detail_url = first_match(item, &selectors::LINK)
            .and_then(|link| link.value().attr("href"))
            .map(|href| self.resolve(href))
            .unwrap_or_default();

        let image_url = first_match(item, &selectors::IMAGE)
            .and_then(|img| {
                selectors::IMAGE_ATTRS
                    .iter()
                    .filter_map(|attr| img.value().attr(attr))
                    .map(str::trim)
                    .find(|src| !src.is_empty() && !src.starts_with("data:"))
            })
            .map(|src| self.resolve(src))
            .unwrap_or_default();

        let free_term = self.marketplace.free_shipping_term.to_lowercase();
        let free_shipping = first_match(item, &selectors::SHIPPING)
            .map(|el| text_of(el).to_lowercase().contains(&free_term))
            .unwrap_or(false);

        let seller = first_match(item, &selectors::SELLER)
            .map(text_of)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| STANDARD_SELLER.to_string());

        let rating = first_match(item, &selectors::RATING).and_then(|el| parse_rating(&text_of(el)));

        ProductRecord {
            title,
            price_display,
            price_numeric,
            detail_url,
            image_url,
            free_shipping,
            seller,
            rating,
        }
    }

    fn display_price(&self, fraction: &str, cents: Option<&str>) -> String {
        match cents {
            Some(cents) if cents != "00" => {
                format!("{fraction}{}{cents}", self.marketplace.decimal_separator)
            }
            _ => fraction.to_string(),
        }
    }

    fn resolve(&self, href: &str) -> String {
        match &self.page_url {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

/// Whether the page offers an enabled "next page" control.
pub fn has_next_page(document: &Html) -> bool {
    document.select(&selectors::NEXT_ENABLED).next().is_some()
}

fn first_match<'a>(item: ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|selector| item.select(selector).next())
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
