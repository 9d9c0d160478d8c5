//! Catalog store: durable keyed collection of product rows.
//!
//! The single source of truth. Rows are created only during ingestion
//! (`INSERT OR IGNORE`, so duplicate ids are silently dropped) and never
//! updated or deleted afterwards. Every read goes through a
//! [`ProductFilter`], which keeps the month/search predicate identical
//! across all query operations.
//!
//! The pool is injected at construction; nothing in here reaches for
//! global state.

use sqlx::{Row, SqlitePool};

use crate::error::EngineResult;
use crate::filter::{BindValue, ProductFilter, ProductOrder};
use crate::models::{
    CategoryCount, IngestLogEntry, PriceHistogram, Product, SalesStatistics,
    StatisticsAndPriceRange,
};

/// Appends the filter's positional bind values to a query of any shape
/// (`query`, `query_as`, `query_scalar`).
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        for value in $filter.bind_values() {
            q = match value {
                BindValue::Int(v) => q.bind(v),
                BindValue::Real(v) => q.bind(v),
                BindValue::Text(v) => q.bind(v),
            };
        }
        q
    }};
}

const PRODUCT_COLUMNS: &str =
    "id, title, price, description, category, image_url, sold, date_of_sale";

/// All thirteen aggregate columns of the combined report: the three sales
/// totals plus the ten histogram buckets, computable in one scan.
const SALES_AGGREGATES: &str = r#"
    COALESCE(SUM(CASE WHEN sold = 1 THEN price ELSE 0 END), 0) AS total_sales,
    COUNT(CASE WHEN sold = 1 THEN 1 END) AS total_items_sold,
    COUNT(CASE WHEN sold = 0 THEN 1 END) AS total_items_not_sold
"#;

// Buckets partition the non-negative price line: fractional prices like
// 100.5 land in the bucket above, so every row is counted exactly once and
// the bucket sum equals the filtered row count.
const BUCKET_AGGREGATES: &str = r#"
    COUNT(CASE WHEN price >= 0 AND price <= 100 THEN 1 END) AS r0_100,
    COUNT(CASE WHEN price > 100 AND price <= 200 THEN 1 END) AS r101_200,
    COUNT(CASE WHEN price > 200 AND price <= 300 THEN 1 END) AS r201_300,
    COUNT(CASE WHEN price > 300 AND price <= 400 THEN 1 END) AS r301_400,
    COUNT(CASE WHEN price > 400 AND price <= 500 THEN 1 END) AS r401_500,
    COUNT(CASE WHEN price > 500 AND price <= 600 THEN 1 END) AS r501_600,
    COUNT(CASE WHEN price > 600 AND price <= 700 THEN 1 END) AS r601_700,
    COUNT(CASE WHEN price > 700 AND price <= 800 THEN 1 END) AS r701_800,
    COUNT(CASE WHEN price > 800 AND price <= 900 THEN 1 END) AS r801_900,
    COUNT(CASE WHEN price > 900 THEN 1 END) AS r901_above
"#;

/// Handle over the `products` and `ingest_log` tables.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a product only if no row with the same id exists; otherwise
    /// no-op. Returns whether a row was actually inserted.
    pub async fn upsert_if_absent(&self, product: &Product) -> EngineResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO products
                (id, title, price, description, category, image_url, sold, date_of_sale)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.sold)
        .bind(&product.date_of_sale)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch one page of matching rows in the given order.
    pub async fn query_rows(
        &self,
        filter: &ProductFilter,
        order: ProductOrder,
        limit: i64,
        offset: i64,
    ) -> EngineResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            filter.where_sql(),
            order.sql(),
        );
        let query = bind_filter!(sqlx::query_as::<_, Product>(&sql), filter)
            .bind(limit)
            .bind(offset);
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Count rows under the identical predicate used by [`Self::query_rows`].
    pub async fn count_rows(&self, filter: &ProductFilter) -> EngineResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM products WHERE {}",
            filter.where_sql()
        );
        let query = bind_filter!(sqlx::query_scalar::<_, i64>(&sql), filter);
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// One-pass sales totals: summed sold prices plus sold/unsold counts.
    pub async fn sales_statistics(&self, filter: &ProductFilter) -> EngineResult<SalesStatistics> {
        let sql = format!(
            "SELECT {SALES_AGGREGATES} FROM products WHERE {}",
            filter.where_sql()
        );
        let row = bind_filter!(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(statistics_from_row(&row))
    }

    /// One-pass histogram over the ten fixed price buckets.
    pub async fn price_histogram(&self, filter: &ProductFilter) -> EngineResult<PriceHistogram> {
        let sql = format!(
            "SELECT {BUCKET_AGGREGATES} FROM products WHERE {}",
            filter.where_sql()
        );
        let row = bind_filter!(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(histogram_from_row(&row))
    }

    /// Sales totals and histogram together, in a single scan of the
    /// filtered set.
    pub async fn statistics_and_price_range(
        &self,
        filter: &ProductFilter,
    ) -> EngineResult<StatisticsAndPriceRange> {
        let sql = format!(
            "SELECT {SALES_AGGREGATES}, {BUCKET_AGGREGATES} FROM products WHERE {}",
            filter.where_sql()
        );
        let row = bind_filter!(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(StatisticsAndPriceRange {
            statistics: statistics_from_row(&row),
            price_range: histogram_from_row(&row),
        })
    }

    /// Item counts per distinct category value, ordered alphabetically so
    /// the output is deterministic.
    pub async fn category_counts(
        &self,
        filter: &ProductFilter,
    ) -> EngineResult<Vec<CategoryCount>> {
        let sql = format!(
            "SELECT category, COUNT(*) AS total_items FROM products WHERE {} \
             GROUP BY category ORDER BY category ASC",
            filter.where_sql()
        );
        let query = bind_filter!(sqlx::query_as::<_, CategoryCount>(&sql), filter);
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Append a bookkeeping row for a completed ingestion pass.
    pub async fn record_ingest(
        &self,
        fetched: i64,
        inserted: i64,
        skipped: i64,
    ) -> EngineResult<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO ingest_log (fetched, inserted, skipped, completed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(fetched)
        .bind(inserted)
        .bind(skipped)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent ingestion pass, if any.
    pub async fn last_ingest(&self) -> EngineResult<Option<IngestLogEntry>> {
        let entry = sqlx::query_as::<_, IngestLogEntry>(
            "SELECT fetched, inserted, skipped, completed_at FROM ingest_log \
             ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }
}

fn statistics_from_row(row: &sqlx::sqlite::SqliteRow) -> SalesStatistics {
    SalesStatistics {
        total_sales: row.get("total_sales"),
        total_items_sold: row.get("total_items_sold"),
        total_items_not_sold: row.get("total_items_not_sold"),
    }
}

fn histogram_from_row(row: &sqlx::sqlite::SqliteRow) -> PriceHistogram {
    PriceHistogram {
        r0_100: row.get("r0_100"),
        r101_200: row.get("r101_200"),
        r201_300: row.get("r201_300"),
        r301_400: row.get("r301_400"),
        r401_500: row.get("r401_500"),
        r501_600: row.get("r501_600"),
        r601_700: row.get("r601_700"),
        r701_800: row.get("r701_800"),
        r801_900: row.get("r801_900"),
        r901_above: row.get("r901_above"),
    }
}
