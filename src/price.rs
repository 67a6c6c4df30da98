//! Locale price and rating parsing.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::config::Marketplace;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static RATING_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

pub const UNPARSABLE: &str = "unparsable";

/// Numeric value of a listing price.
///
/// `Unparsable` is a distinct tag rather than zero, so a broken price never
/// shows up as the cheapest item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Amount(f64),
    Unparsable,
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(v) => Some(*v),
            Price::Unparsable => None,
        }
    }

    pub fn is_parsable(&self) -> bool {
        matches!(self, Price::Amount(_))
    }

    /// Ascending order with `Unparsable` after every amount.
    pub fn ascending(&self, other: &Price) -> Ordering {
        match (self, other) {
            (Price::Amount(a), Price::Amount(b)) => a.total_cmp(b),
            (Price::Amount(_), Price::Unparsable) => Ordering::Less,
            (Price::Unparsable, Price::Amount(_)) => Ordering::Greater,
            (Price::Unparsable, Price::Unparsable) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(v) => write!(f, "{v}"),
            Price::Unparsable => f.write_str(UNPARSABLE),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Amount(v) => serializer.serialize_f64(*v),
            Price::Unparsable => serializer.serialize_str(UNPARSABLE),
        }
    }
}

/// Converts an integer part and optional cents, both as rendered text, into a [`Price`].
///
/// Thousands separators are stripped from the integer part and absent cents
/// count as `"00"`. An integer part that still carries the decimal separator
/// (`"1.234,50"`) is split on it when no cents were given.
pub fn parse_price(integer: &str, cents: Option<&str>, marketplace: &Marketplace) -> Price {
    let integer = integer.trim();
    let cents = cents.map(str::trim).filter(|c| !c.is_empty());

    let (whole, fraction) = match (integer.split_once(marketplace.decimal_separator), cents) {
        (Some((whole, embedded)), None) => (whole, embedded),
        (Some(_), Some(_)) => return Price::Unparsable,
        (None, cents) => (integer, cents.unwrap_or("00")),
    };

    let whole: String = whole
        .chars()
        .filter(|c| *c != marketplace.thousands_separator)
        .collect();
    if !DIGITS.is_match(&whole) || !DIGITS.is_match(fraction) {
        return Price::Unparsable;
    }

    match format!("{whole}.{fraction}").parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Price::Amount(value),
        _ => Price::Unparsable,
    }
}

/// Reads a 0–5 star rating; anything else is treated as absent.
pub fn parse_rating(text: &str) -> Option<f64> {
    let token = RATING_TOKEN.find(text)?.as_str().replace(',', ".");
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (0.0..=5.0).contains(v))
}
