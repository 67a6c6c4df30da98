//! Summary statistics and export projections of a finalized [`ResultSet`].
//!
//! Nothing here touches storage; [`crate::export`] writes the bytes.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::record::{CSV_HEADERS, ProductRecord, ResultSet};

pub const NOT_APPLICABLE: &str = "not applicable";
pub const NO_VALUE: &str = "N/A";

/// Identity of one scrape run, stamped on the narrative report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunInfo {
    pub id: Uuid,
    pub started_at: DateTime<Local>,
}

impl RunInfo {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
        }
    }
}

impl Default for RunInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    /// Mean of parsable prices with two decimals, or [`NOT_APPLICABLE`].
    pub mean_price: String,
    /// Display price of the cheapest parsable record, or [`NO_VALUE`].
    pub min_price: String,
    /// Display price of the dearest parsable record; the unparsable tail is skipped.
    pub max_price: String,
    pub free_shipping_count: usize,
}

/// Fixed-column projection for tabular export.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: [&'static str; 8],
    pub rows: Vec<Vec<String>>,
}

/// Arithmetic mean over records whose price parsed; `None` when there are none.
pub fn mean_price(results: &ResultSet) -> Option<f64> {
    let amounts: Vec<f64> = results.iter().filter_map(|r| r.price_numeric.amount()).collect();
    if amounts.is_empty() {
        return None;
    }
    Some(amounts.iter().sum::<f64>() / amounts.len() as f64)
}

pub struct ReportBuilder<'a> {
    results: &'a ResultSet,
    search: &'a SearchConfig,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(results: &'a ResultSet, search: &'a SearchConfig) -> Self {
        Self { results, search }
    }

    pub fn summary(&self) -> Summary {
        // the set is sorted with unparsable prices last, so parsable records form a prefix
        let mut priced = self.results.iter().filter(|r| r.price_numeric.is_parsable());
        let cheapest = priced.next();
        let dearest = priced.last().or(cheapest);

        Summary {
            count: self.results.len(),
            mean_price: mean_price(self.results)
                .map(|mean| format!("{mean:.2}"))
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            min_price: price_or_none(cheapest),
            max_price: price_or_none(dearest),
            free_shipping_count: self.results.iter().filter(|r| r.free_shipping).count(),
        }
    }

    pub fn table(&self) -> Table {
        Table {
            headers: CSV_HEADERS,
            rows: self.results.iter().map(ProductRecord::to_csv_record).collect(),
        }
    }

    /// JSON tree mirroring the result set.
    pub fn tree(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.results)
    }

    /// Self-contained HTML report: summary block followed by one entry per record.
    pub fn html(&self, run: &RunInfo) -> String {
        let summary = self.summary();
        let title = format!("{} on MercadoLibre", self.search.term);
        let range = &self.search.price_range;

        let mut products = String::new();
        for product in self.results {
            render_product(&mut products, product);
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <h1>{title}</h1>
    <div class="summary">
      <h2>Summary</h2>
      <p>Search: "{term}"</p>
      <p>Price range: ${min} - ${max}</p>
      <p>Products found: {count}</p>
      <p>Average price: {mean}</p>
      <p>Lowest price: {lowest}</p>
      <p>Highest price: {highest}</p>
      <p>Free shipping: {free}</p>
    </div>
    <h2>Products (cheapest first)</h2>
{products}    <p class="footer">Run {run_id} started {started}</p>
  </div>
</body>
</html>
"#,
            title = encode_text(&title),
            term = encode_text(&self.search.term),
            min = range.render_min(),
            max = range.render_max(),
            count = summary.count,
            mean = money(&summary.mean_price, NOT_APPLICABLE),
            lowest = money(&summary.min_price, NO_VALUE),
            highest = money(&summary.max_price, NO_VALUE),
            free = summary.free_shipping_count,
            run_id = run.id,
            started = run.started_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

fn price_or_none(record: Option<&ProductRecord>) -> String {
    record
        .map(|r| r.price_display.clone())
        .unwrap_or_else(|| NO_VALUE.to_string())
}

fn money(value: &str, sentinel: &str) -> String {
    if value == sentinel {
        value.to_string()
    } else {
        format!("${}", encode_text(value))
    }
}

fn image_block(product: &ProductRecord) -> String {
    if product.image_url.is_empty() {
        return String::new();
    }
    format!(
        "      <div class=\"image\"><img src=\"{}\" alt=\"{}\"></div>\n",
        encode_double_quoted_attribute(&product.image_url),
        encode_double_quoted_attribute(&product.title),
    )
}

fn render_product(out: &mut String, product: &ProductRecord) {
    let _ = write!(
        out,
        r#"    <div class="product">
{image}      <div class="details">
        <h3><a href="{url}" target="_blank">{title}</a></h3>
        <p class="price">${price}</p>
        <p class="seller">Seller: {seller}</p>
"#,
        image = image_block(product),
        url = encode_double_quoted_attribute(&product.detail_url),
        title = encode_text(&product.title),
        price = encode_text(&product.price_display),
        seller = encode_text(&product.seller),
    );
    if product.free_shipping {
        out.push_str("        <p class=\"shipping\">Free shipping</p>\n");
    }
    if let Some(rating) = product.rating {
        let _ = writeln!(out, "        <p class=\"reviews\">Rating: {rating}/5</p>");
    }
    out.push_str("      </div>\n    </div>\n");
}

const STYLE: &str = "
    body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 20px; background-color: #f4f4f4; }
    h1 { color: #333; text-align: center; margin-bottom: 20px; }
    .container { max-width: 1200px; margin: 0 auto; }
    .product { display: flex; margin-bottom: 20px; background-color: white; border-radius: 8px; overflow: hidden; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
    .image { flex: 0 0 150px; padding: 10px; }
    .image img { width: 100%; height: auto; max-height: 150px; object-fit: contain; }
    .details { flex: 1; padding: 15px; }
    h3 { margin-top: 0; margin-bottom: 10px; }
    a { color: #0066c0; text-decoration: none; }
    a:hover { text-decoration: underline; }
    .price { font-size: 18px; font-weight: bold; color: #B12704; margin: 5px 0; }
    .shipping { color: #067D62; font-weight: bold; }
    .seller, .reviews { color: #555; margin: 5px 0; }
    .summary { background-color: white; padding: 15px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
    .footer { color: #888; font-size: 12px; text-align: center; }
  ";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::ResultAccumulator;
    use crate::config::Marketplace;
    use crate::price::Price;
    use crate::record::STANDARD_SELLER;

    fn search() -> SearchConfig {
        SearchConfig::new("zapatillas nike", 10, Marketplace::new("mla").unwrap()).unwrap()
    }

    fn record(title: &str, display: &str, price: Price, free_shipping: bool) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            price_display: display.to_string(),
            price_numeric: price,
            detail_url: format!("https://example.com/{title}"),
            image_url: String::new(),
            free_shipping,
            seller: STANDARD_SELLER.to_string(),
            rating: None,
        }
    }

    fn finalized(records: Vec<ProductRecord>) -> ResultSet {
        let mut acc = ResultAccumulator::new(10);
        acc.append(records);
        acc.finalize()
    }

    #[test]
    fn empty_summary_uses_sentinels() {
        let results = ResultSet::default();
        let summary = ReportBuilder::new(&results, &search()).summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean_price, NOT_APPLICABLE);
        assert_eq!(summary.min_price, NO_VALUE);
        assert_eq!(summary.max_price, NO_VALUE);
        assert_eq!(summary.free_shipping_count, 0);
    }

    #[test]
    fn summary_ignores_unparsable_prices() {
        let results = finalized(vec![
            record("b", "30", Price::Amount(30.0), true),
            record("x", "unavailable", Price::Unparsable, true),
            record("a", "10", Price::Amount(10.0), false),
        ]);
        let summary = ReportBuilder::new(&results, &search()).summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean_price, "20.00");
        assert_eq!(summary.min_price, "10");
        assert_eq!(summary.max_price, "30");
        assert_eq!(summary.free_shipping_count, 2);
    }

    #[test]
    fn single_priced_record_is_both_min_and_max() {
        let results = finalized(vec![record("a", "1.500", Price::Amount(1500.0), false)]);
        let summary = ReportBuilder::new(&results, &search()).summary();
        assert_eq!(summary.min_price, "1.500");
        assert_eq!(summary.max_price, "1.500");
    }

    #[test]
    fn table_has_fixed_columns() {
        let results = finalized(vec![record("a", "10", Price::Amount(10.0), false)]);
        let table = ReportBuilder::new(&results, &search()).table();
        assert_eq!(table.headers[0], "Title");
        assert_eq!(table.headers[7], "Rating");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][2], "10");
    }

    #[test]
    fn tree_mirrors_result_order() {
        let results = finalized(vec![
            record("b", "30", Price::Amount(30.0), false),
            record("a", "10", Price::Amount(10.0), false),
        ]);
        let tree = ReportBuilder::new(&results, &search()).tree().unwrap();
        let titles: Vec<&str> = tree
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["a", "b"]);
    }

    #[test]
    fn html_escapes_and_embeds_summary() {
        let mut rated = record("<script>", "10", Price::Amount(10.0), true);
        rated.rating = Some(4.5);
        let results = finalized(vec![rated]);
        let html = ReportBuilder::new(&results, &search()).html(&RunInfo::new());
        assert!(html.contains(">&lt;script&gt;</a>"));
        assert!(html.contains("Products found: 1"));
        assert!(html.contains("Average price: $10.00"));
        assert!(html.contains("Free shipping</p>"));
        assert!(html.contains("Rating: 4.5/5"));
        assert!(html.contains("Price range: $* - $*"));
    }

    #[test]
    fn html_omits_missing_images() {
        let mut pictured = record("a", "10", Price::Amount(10.0), false);
        pictured.image_url = "https://http2.mlstatic.com/a.webp".to_string();
        let bare = record("b", "20", Price::Amount(20.0), false);
        let results = finalized(vec![pictured, bare]);
        let html = ReportBuilder::new(&results, &search()).html(&RunInfo::new());
        assert_eq!(html.matches("<img").count(), 1);
        assert!(html.contains(r#"<img src="https://http2.mlstatic.com/a.webp" alt="a">"#));
        assert!(!html.contains(r#"src="""#));
    }

    #[test]
    fn empty_html_shows_sentinels() {
        let results = ResultSet::default();
        let html = ReportBuilder::new(&results, &search()).html(&RunInfo::new());
        assert!(html.contains("Average price: not applicable"));
        assert!(html.contains("Lowest price: N/A"));
    }
}
