//! CSS selectors for MercadoLibre listing pages.
//!
//! Field selectors are ordered chains: the first candidate that matches inside
//! an item container wins. Legacy `ui-search` markup comes first, the newer
//! `poly-component` card markup second.

use std::sync::LazyLock;

use scraper::Selector;

/// Search box on the marketplace home page.
pub const SEARCH_INPUT: &str = ".nav-search-input";
/// Submit button next to the search box.
pub const SEARCH_BUTTON: &str = ".nav-search-btn";
/// One listing item inside the results layout.
pub const ITEM_CONTAINER: &str = ".ui-search-layout .ui-search-layout__item";
/// Clickable next-page control.
pub const NEXT_BUTTON: &str = ".andes-pagination__button--next";
/// Next-page control that is not disabled.
pub const NEXT_BUTTON_ENABLED: &str =
    ".andes-pagination__button--next:not(.andes-pagination__button--disabled)";

fn parse(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

fn chain(candidates: &[&str]) -> Vec<Selector> {
    candidates.iter().map(|css| parse(css)).collect()
}

pub static ITEM: LazyLock<Selector> = LazyLock::new(|| parse(ITEM_CONTAINER));

pub static NEXT_ENABLED: LazyLock<Selector> = LazyLock::new(|| parse(NEXT_BUTTON_ENABLED));

pub static TITLE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| chain(&[".ui-search-item__title", ".poly-component__title"]));

pub static PRICE_FRACTION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    chain(&[
        ".price-tag-amount .price-tag-fraction",
        ".poly-price__current .andes-money-amount__fraction",
    ])
});

pub static PRICE_CENTS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    chain(&[
        ".price-tag-amount .price-tag-cents",
        ".poly-price__current .andes-money-amount__cents",
    ])
});

pub static LINK: LazyLock<Vec<Selector>> =
    LazyLock::new(|| chain(&[".ui-search-link", ".poly-component__title"]));

pub static IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    chain(&[
        ".ui-search-result-image__element",
        ".slick-slide.slick-active img",
        ".poly-component__picture",
    ])
});

pub static SHIPPING: LazyLock<Vec<Selector>> =
    LazyLock::new(|| chain(&[".ui-search-item__shipping", ".poly-component__shipping"]));

pub static SELLER: LazyLock<Vec<Selector>> =
    LazyLock::new(|| chain(&[".ui-search-official-store-label", ".poly-component__seller"]));

pub static RATING: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    chain(&[
        ".ui-search-reviews__rating-number",
        ".poly-reviews__rating",
    ])
});

/// Image attributes, in preference order; lazy-loaded images keep the URL in `data-src`.
pub const IMAGE_ATTRS: [&str; 2] = ["src", "data-src"];
