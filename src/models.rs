//! Core data models used throughout Storefront Analytics.
//!
//! These types represent the catalog rows, search pages, and aggregate
//! reports that flow through the ingestion and query pipeline.

use serde::{Deserialize, Serialize};

/// A catalog row as persisted in the `products` table.
///
/// The `id` is externally assigned by the upstream catalog and is never
/// generated locally.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub sold: bool,
    pub date_of_sale: String,
}

/// Raw record produced by a catalog source before normalization.
///
/// The upstream feed is camelCase JSON (`dateOfSale`, `image`); this type
/// absorbs that shape and maps it onto the storage model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    #[serde(rename = "image")]
    pub image_url: String,
    pub sold: bool,
    pub date_of_sale: String,
}

impl CatalogRecord {
    pub fn into_product(self) -> Product {
        Product {
            id: self.id,
            title: self.title,
            price: self.price,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            sold: self.sold,
            date_of_sale: self.date_of_sale,
        }
    }
}

/// One page of search results plus the has-next-page marker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub rows: Vec<Product>,
    pub has_next_page: bool,
}

/// Sales totals over a month-filtered set of rows.
///
/// An empty set resolves to zeros, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatistics {
    pub total_sales: f64,
    pub total_items_sold: i64,
    pub total_items_not_sold: i64,
}

/// The ten fixed price buckets of the histogram.
///
/// Buckets are closed ranges of width 100 except the last, which is
/// open-ended above 901. A row falls into exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistogram {
    #[serde(rename = "0-100")]
    pub r0_100: i64,
    #[serde(rename = "101-200")]
    pub r101_200: i64,
    #[serde(rename = "201-300")]
    pub r201_300: i64,
    #[serde(rename = "301-400")]
    pub r301_400: i64,
    #[serde(rename = "401-500")]
    pub r401_500: i64,
    #[serde(rename = "501-600")]
    pub r501_600: i64,
    #[serde(rename = "601-700")]
    pub r601_700: i64,
    #[serde(rename = "701-800")]
    pub r701_800: i64,
    #[serde(rename = "801-900")]
    pub r801_900: i64,
    #[serde(rename = "901-above")]
    pub r901_above: i64,
}

impl PriceHistogram {
    /// Sum over all buckets. Equals the month-filtered row count.
    pub fn total(&self) -> i64 {
        self.r0_100
            + self.r101_200
            + self.r201_300
            + self.r301_400
            + self.r401_500
            + self.r501_600
            + self.r601_700
            + self.r701_800
            + self.r801_900
            + self.r901_above
    }
}

/// Item count for one distinct category value.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub total_items: i64,
}

/// Sales totals and the price histogram computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsAndPriceRange {
    #[serde(flatten)]
    pub statistics: SalesStatistics,
    #[serde(flatten)]
    pub price_range: PriceHistogram,
}

/// Combined report: single-pass totals/histogram plus the grouped
/// category counts, both under the same month filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    pub statistics_and_price_range: StatisticsAndPriceRange,
    pub categories: Vec<CategoryCount>,
}

/// Bookkeeping row describing one completed ingestion pass.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestLogEntry {
    pub fetched: i64,
    pub inserted: i64,
    pub skipped: i64,
    pub completed_at: i64,
}
