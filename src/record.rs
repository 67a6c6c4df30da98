// --- Structs for extracted listing data ---

use serde::Serialize;

use crate::price::Price;

pub const NO_TITLE: &str = "no title";
pub const PRICE_UNAVAILABLE: &str = "unavailable";
pub const STANDARD_SELLER: &str = "standard seller";

pub const CSV_HEADERS: [&str; 8] = [
    "Title",
    "Price",
    "Price Numeric",
    "URL",
    "Image",
    "Free Shipping",
    "Seller",
    "Rating",
];

/// One listing item, normalized. Built by the extractor and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub title: String,
    pub price_display: String,
    pub price_numeric: Price,
    pub detail_url: String,
    pub image_url: String,
    pub free_shipping: bool,
    pub seller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ProductRecord {
    /// Row in [`CSV_HEADERS`] order.
    pub fn to_csv_record(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.price_display.clone(),
            self.price_numeric.to_string(),
            self.detail_url.clone(),
            self.image_url.clone(),
            self.free_shipping.to_string(),
            self.seller.clone(),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
        ]
    }
}

/// Finalized records: at most the ceiling, sorted ascending by price.
///
/// There is no mutating API; the only way to build one is
/// [`ResultAccumulator::finalize`](crate::accumulator::ResultAccumulator::finalize).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<ProductRecord>,
}

impl ResultSet {
    pub(crate) fn from_sorted(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_row_follows_header_order() {
        let record = ProductRecord {
            title: "Zapatilla".into(),
            price_display: "1.234,50".into(),
            price_numeric: Price::Amount(1234.5),
            detail_url: "https://example.com/p".into(),
            image_url: String::new(),
            free_shipping: true,
            seller: STANDARD_SELLER.into(),
            rating: None,
        };
        assert_eq!(
            record.to_csv_record(),
            vec!["Zapatilla", "1.234,50", "1234.5", "https://example.com/p", "", "true", "standard seller", ""]
        );
        assert_eq!(record.to_csv_record().len(), CSV_HEADERS.len());
    }

    #[test]
    fn json_uses_camel_case_and_omits_missing_rating() {
        let record = ProductRecord {
            title: NO_TITLE.into(),
            price_display: PRICE_UNAVAILABLE.into(),
            price_numeric: Price::Unparsable,
            detail_url: String::new(),
            image_url: String::new(),
            free_shipping: false,
            seller: STANDARD_SELLER.into(),
            rating: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["priceNumeric"], "unparsable");
        assert_eq!(value["freeShipping"], false);
        assert!(value.get("rating").is_none());
    }
}
