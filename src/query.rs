//! Query engine: the five read operations.
//!
//! Wraps the [`CatalogStore`] with argument validation and pagination
//! arithmetic. Each operation builds its predicate through
//! [`ProductFilter`], so month filtering behaves identically everywhere.
//! All operations are pure reads and may run concurrently without
//! coordination.

use crate::error::{EngineError, EngineResult};
use crate::filter::ProductFilter;
use crate::models::{
    CategoryCount, CombinedReport, PriceHistogram, SalesStatistics, SearchPage,
};
use crate::store::CatalogStore;

/// Read-only facade over the catalog store.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: CatalogStore,
}

impl QueryEngine {
    /// Construct around an injected store. The engine never opens or owns
    /// connections itself.
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Paginated search.
    ///
    /// The term's mode (numeric vs. text) picks both the predicate and the
    /// ordering; see [`crate::filter::SearchMode`]. `page` is 1-indexed.
    /// `has_next_page` comes from a separate count under the identical
    /// predicate, so it stays correct when the last page is exactly full.
    pub async fn search(
        &self,
        month: Option<u32>,
        term: &str,
        page: u32,
        page_size: u32,
    ) -> EngineResult<SearchPage> {
        if page == 0 {
            return Err(EngineError::InvalidArgument(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(EngineError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }

        let filter = ProductFilter::with_search(month, term)?;
        let order = filter.order();

        let limit = i64::from(page_size);
        let offset = (i64::from(page) - 1) * limit;
        let rows = self.store.query_rows(&filter, order, limit, offset).await?;

        let total = self.store.count_rows(&filter).await?;
        let total_pages = total_page_count(total, limit);
        let has_next_page = i64::from(page) < total_pages;

        Ok(SearchPage {
            rows,
            has_next_page,
        })
    }

    /// Sales totals over the month-filtered set (no search).
    pub async fn statistics(&self, month: Option<u32>) -> EngineResult<SalesStatistics> {
        let filter = ProductFilter::month_only(month)?;
        self.store.sales_statistics(&filter).await
    }

    /// Counts per fixed price bucket over the month-filtered set.
    pub async fn price_range(&self, month: Option<u32>) -> EngineResult<PriceHistogram> {
        let filter = ProductFilter::month_only(month)?;
        self.store.price_histogram(&filter).await
    }

    /// Item counts per distinct category, alphabetical.
    pub async fn categories(&self, month: Option<u32>) -> EngineResult<Vec<CategoryCount>> {
        let filter = ProductFilter::month_only(month)?;
        self.store.category_counts(&filter).await
    }

    /// Statistics and histogram in one scan, categories as a second grouped
    /// pass, the same month filter applied to both.
    pub async fn combined_report(&self, month: Option<u32>) -> EngineResult<CombinedReport> {
        let filter = ProductFilter::month_only(month)?;
        let statistics_and_price_range =
            self.store.statistics_and_price_range(&filter).await?;
        let categories = self.store.category_counts(&filter).await?;
        Ok(CombinedReport {
            statistics_and_price_range,
            categories,
        })
    }
}

/// `ceil(total / page_size)` without touching floats. `page_size` is
/// validated non-zero by the caller.
fn total_page_count(total: i64, page_size: i64) -> i64 {
    (total + page_size - 1) / page_size
}
