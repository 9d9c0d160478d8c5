use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use storefront_analytics::config::{
    CatalogConfig, Config, DbConfig, PaginationConfig, ServerConfig,
};
use storefront_analytics::connector_http::CatalogSource;
use storefront_analytics::db;
use storefront_analytics::error::EngineError;
use storefront_analytics::filter::ProductFilter;
use storefront_analytics::ingest::ingest_from_source;
use storefront_analytics::migrate;
use storefront_analytics::models::{CatalogRecord, Product};
use storefront_analytics::query::QueryEngine;
use storefront_analytics::store::CatalogStore;

fn test_config(root: &Path) -> Config {
    Config {
        db: DbConfig {
            path: root.join("data").join("sfa.sqlite"),
        },
        catalog: CatalogConfig {
            source_url: "http://127.0.0.1:9/catalog.json".to_string(),
            fetch_max_retries: 1,
            fetch_initial_backoff_ms: 1,
            fetch_timeout_secs: 1,
        },
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        },
        pagination: PaginationConfig::default(),
    }
}

async fn setup_store() -> (TempDir, CatalogStore) {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let pool = db::connect(&config.db).await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (tmp, CatalogStore::new(pool))
}

fn product(
    id: i64,
    title: &str,
    price: f64,
    description: &str,
    category: &str,
    sold: bool,
    date_of_sale: &str,
) -> Product {
    Product {
        id,
        title: title.to_string(),
        price,
        description: description.to_string(),
        category: category.to_string(),
        image_url: format!("https://cdn.example.com/{id}.jpg"),
        sold,
        date_of_sale: date_of_sale.to_string(),
    }
}

/// Six rows spanning two months (June appears in two different years) and
/// three categories. Row 3's description contains "49" so numeric searches
/// can hit the substring arms.
fn seed_catalog() -> Vec<Product> {
    vec![
        product(
            1,
            "Mechanical Keyboard",
            50.0,
            "tenkeyless board",
            "electronics",
            true,
            "2024-03-05T10:00:00Z",
        ),
        product(
            2,
            "Office Chair",
            150.0,
            "mesh back",
            "furniture",
            false,
            "2024-03-10T10:00:00Z",
        ),
        product(
            3,
            "4tb External Drive",
            250.0,
            "portable 4tb storage, model 49S",
            "electronics",
            true,
            "2024-06-15T10:00:00Z",
        ),
        product(
            4,
            "Desk Lamp",
            40.0,
            "warm light",
            "furniture",
            false,
            "2024-06-20T10:00:00Z",
        ),
        product(
            5,
            "Monitor",
            950.0,
            "ultrawide panel",
            "electronics",
            true,
            "2024-06-25T10:00:00Z",
        ),
        product(
            6,
            "Notebook",
            5.0,
            "ruled pages",
            "stationery",
            false,
            "2023-06-01T10:00:00Z",
        ),
    ]
}

async fn seeded_engine() -> (TempDir, QueryEngine) {
    let (tmp, store) = setup_store().await;
    for p in seed_catalog() {
        assert!(store.upsert_if_absent(&p).await.unwrap());
    }
    (tmp, QueryEngine::new(store))
}

fn ids(rows: &[Product]) -> Vec<i64> {
    rows.iter().map(|p| p.id).collect()
}

// ============ Statistics / histogram / categories ============

#[tokio::test]
async fn test_statistics_example() {
    let (_tmp, store) = setup_store().await;
    store
        .upsert_if_absent(&product(1, "a", 50.0, "", "A", true, "2024-03-05"))
        .await
        .unwrap();
    store
        .upsert_if_absent(&product(2, "b", 150.0, "", "B", false, "2024-03-10"))
        .await
        .unwrap();
    let engine = QueryEngine::new(store);

    let stats = engine.statistics(Some(3)).await.unwrap();
    assert!((stats.total_sales - 50.0).abs() < 1e-9);
    assert_eq!(stats.total_items_sold, 1);
    assert_eq!(stats.total_items_not_sold, 1);

    let histogram = engine.price_range(Some(3)).await.unwrap();
    assert_eq!(histogram.r0_100, 1);
    assert_eq!(histogram.r101_200, 1);
    assert_eq!(histogram.total(), 2);

    let categories = engine.categories(Some(3)).await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].category, "A");
    assert_eq!(categories[0].total_items, 1);
    assert_eq!(categories[1].category, "B");
    assert_eq!(categories[1].total_items, 1);
}

#[tokio::test]
async fn test_statistics_empty_store_resolves_to_zeros() {
    let (_tmp, store) = setup_store().await;
    let engine = QueryEngine::new(store);

    let stats = engine.statistics(Some(7)).await.unwrap();
    assert_eq!(stats.total_sales, 0.0);
    assert_eq!(stats.total_items_sold, 0);
    assert_eq!(stats.total_items_not_sold, 0);

    let histogram = engine.price_range(None).await.unwrap();
    assert_eq!(histogram.total(), 0);

    let categories = engine.categories(None).await.unwrap();
    assert!(categories.is_empty());
}

#[tokio::test]
async fn test_sold_plus_unsold_equals_row_count() {
    let (_tmp, engine) = seeded_engine().await;

    for month in [None, Some(3), Some(6)] {
        let stats = engine.statistics(month).await.unwrap();
        let filter = ProductFilter::month_only(month).unwrap();
        let count = engine.store().count_rows(&filter).await.unwrap();
        assert_eq!(stats.total_items_sold + stats.total_items_not_sold, count);
    }
}

#[tokio::test]
async fn test_histogram_sum_matches_row_count() {
    let (_tmp, engine) = seeded_engine().await;

    for month in [None, Some(3), Some(6), Some(11)] {
        let histogram = engine.price_range(month).await.unwrap();
        let filter = ProductFilter::month_only(month).unwrap();
        let count = engine.store().count_rows(&filter).await.unwrap();
        assert_eq!(histogram.total(), count);
    }
}

#[tokio::test]
async fn test_histogram_bucket_boundaries() {
    let (_tmp, store) = setup_store().await;
    for (id, price) in [(1, 0.0), (2, 100.0), (3, 100.5), (4, 900.5), (5, 901.0)] {
        store
            .upsert_if_absent(&product(id, "p", price, "", "X", false, "2024-01-01"))
            .await
            .unwrap();
    }
    let engine = QueryEngine::new(store);

    let histogram = engine.price_range(None).await.unwrap();
    assert_eq!(histogram.r0_100, 2);
    // Fractional prices between the labeled endpoints land in the bucket
    // above, so every row is counted exactly once.
    assert_eq!(histogram.r101_200, 1);
    assert_eq!(histogram.r901_above, 2);
    assert_eq!(histogram.total(), 5);
}

#[tokio::test]
async fn test_categories_are_alphabetical() {
    let (_tmp, engine) = seeded_engine().await;

    let categories = engine.categories(None).await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["electronics", "furniture", "stationery"]);

    let june = engine.categories(Some(6)).await.unwrap();
    let names: Vec<&str> = june.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["electronics", "furniture", "stationery"]);
}

#[tokio::test]
async fn test_combined_report_matches_individual_operations() {
    let (_tmp, engine) = seeded_engine().await;

    let report = engine.combined_report(Some(6)).await.unwrap();
    let stats = engine.statistics(Some(6)).await.unwrap();
    let histogram = engine.price_range(Some(6)).await.unwrap();
    let categories = engine.categories(Some(6)).await.unwrap();

    assert_eq!(report.statistics_and_price_range.statistics, stats);
    assert_eq!(report.statistics_and_price_range.price_range, histogram);
    assert_eq!(report.categories, categories);
}

// ============ Search ============

#[tokio::test]
async fn test_empty_search_applies_month_filter() {
    let (_tmp, engine) = seeded_engine().await;

    let page = engine.search(Some(6), "", 1, 10).await.unwrap();
    // The month filter is month-of-year: June rows from both 2023 and 2024
    // qualify. Insertion (id) order.
    assert_eq!(ids(&page.rows), vec![3, 4, 5, 6]);
    assert!(!page.has_next_page);
    for row in &page.rows {
        assert!(row.date_of_sale.contains("-06-"));
    }
}

#[tokio::test]
async fn test_text_search_falls_back_to_matching_all_rows() {
    let (_tmp, engine) = seeded_engine().await;

    // Text mode keeps the price arm always-true, so even a term that hits
    // no title or description matches every row. Ordering is by id.
    let page = engine.search(None, "zzz-no-match", 1, 10).await.unwrap();
    assert_eq!(ids(&page.rows), vec![1, 2, 3, 4, 5, 6]);
    assert!(!page.has_next_page);
}

#[tokio::test]
async fn test_alphanumeric_search_is_text_mode() {
    let (_tmp, engine) = seeded_engine().await;

    // "4tb" fails the numeric parse, so it must not become a price cap of
    // 4: the result keeps id ordering, not price ordering.
    let page = engine.search(None, "4tb", 1, 10).await.unwrap();
    assert_eq!(ids(&page.rows), vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_numeric_search_filters_and_orders_by_price() {
    let (_tmp, engine) = seeded_engine().await;

    // price <= 49 matches rows 4 and 6; row 3's description contains "49"
    // so the substring arm pulls it in despite its price. Numeric mode
    // orders by price descending, id ascending.
    let page = engine.search(None, "49", 1, 10).await.unwrap();
    assert_eq!(ids(&page.rows), vec![3, 4, 6]);
}

#[tokio::test]
async fn test_numeric_search_ties_break_by_id() {
    let (_tmp, store) = setup_store().await;
    for id in [9, 7, 8] {
        store
            .upsert_if_absent(&product(id, "widget", 25.0, "", "X", false, "2024-01-01"))
            .await
            .unwrap();
    }
    let engine = QueryEngine::new(store);

    let page = engine.search(None, "30", 1, 10).await.unwrap();
    assert_eq!(ids(&page.rows), vec![7, 8, 9]);
}

#[tokio::test]
async fn test_numeric_search_respects_month_filter() {
    let (_tmp, engine) = seeded_engine().await;

    // March has no row priced <= 49 and no "49" substring: empty page,
    // no next.
    let page = engine.search(Some(3), "49", 1, 10).await.unwrap();
    assert!(page.rows.is_empty());
    assert!(!page.has_next_page);
}

// ============ Pagination ============

#[tokio::test]
async fn test_pagination_walk_covers_all_rows_without_gaps() {
    let (_tmp, engine) = seeded_engine().await;

    let filter = ProductFilter::with_search(Some(6), "").unwrap();
    let total = engine.store().count_rows(&filter).await.unwrap();

    let mut seen = Vec::new();
    let mut page_no = 1;
    loop {
        let page = engine.search(Some(6), "", page_no, 2).await.unwrap();
        seen.extend(ids(&page.rows));
        if !page.has_next_page {
            break;
        }
        page_no += 1;
    }

    assert_eq!(seen.len() as i64, total);
    let mut deduped = seen.clone();
    deduped.dedup();
    assert_eq!(seen, deduped);
}

#[tokio::test]
async fn test_has_next_page_false_on_exactly_full_last_page() {
    let (_tmp, engine) = seeded_engine().await;

    // June has 4 rows; page 2 of size 2 is exactly full and is the last.
    let page1 = engine.search(Some(6), "", 1, 2).await.unwrap();
    assert_eq!(page1.rows.len(), 2);
    assert!(page1.has_next_page);

    let page2 = engine.search(Some(6), "", 2, 2).await.unwrap();
    assert_eq!(page2.rows.len(), 2);
    assert!(!page2.has_next_page);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let (_tmp, engine) = seeded_engine().await;

    let page = engine.search(Some(6), "", 5, 2).await.unwrap();
    assert!(page.rows.is_empty());
    assert!(!page.has_next_page);
}

// ============ Argument validation ============

#[tokio::test]
async fn test_invalid_arguments_are_rejected() {
    let (_tmp, engine) = seeded_engine().await;

    assert!(matches!(
        engine.search(None, "", 0, 10).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.search(None, "", 1, 0).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.search(Some(13), "", 1, 10).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.statistics(Some(0)).await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.price_range(Some(99)).await,
        Err(EngineError::InvalidArgument(_))
    ));
}

// ============ Ingestion ============

#[tokio::test]
async fn test_upsert_if_absent_keeps_first_payload() {
    let (_tmp, store) = setup_store().await;

    let first = product(42, "Original Title", 10.0, "first", "A", false, "2024-05-01");
    assert!(store.upsert_if_absent(&first).await.unwrap());

    let second = product(42, "Replacement", 99.0, "second", "B", true, "2024-06-01");
    assert!(!store.upsert_if_absent(&second).await.unwrap());

    let filter = ProductFilter::month_only(None).unwrap();
    let rows = store
        .query_rows(
            &filter,
            filter.order(),
            10,
            0,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], first);
}

struct FixtureSource {
    records: Vec<CatalogRecord>,
}

#[async_trait]
impl CatalogSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.records.clone())
    }
}

struct FailingSource;

#[async_trait]
impl CatalogSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRecord>> {
        anyhow::bail!("connection refused")
    }
}

fn record(id: i64, title: &str) -> CatalogRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": title,
        "price": 12.5,
        "description": "fixture row",
        "category": "fixtures",
        "image": "https://cdn.example.com/f.jpg",
        "sold": false,
        "dateOfSale": "2024-02-02T00:00:00Z",
    }))
    .unwrap()
}

#[tokio::test]
async fn test_ingest_counts_inserts_and_skips() {
    let (_tmp, store) = setup_store().await;

    let source = FixtureSource {
        records: vec![record(1, "a"), record(2, "b"), record(1, "duplicate")],
    };
    let summary = ingest_from_source(&store, &source).await.unwrap();
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 1);

    let entry = store.last_ingest().await.unwrap().unwrap();
    assert_eq!(entry.fetched, 3);
    assert_eq!(entry.inserted, 2);
    assert_eq!(entry.skipped, 1);

    // A second pass over the same feed inserts nothing.
    let summary = ingest_from_source(&store, &source).await.unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.skipped, 3);
}

#[tokio::test]
async fn test_failed_fetch_is_tolerated() {
    let (_tmp, store) = setup_store().await;
    store
        .upsert_if_absent(&product(1, "kept", 10.0, "", "A", false, "2024-01-01"))
        .await
        .unwrap();

    let summary = ingest_from_source(&store, &FailingSource).await.unwrap();
    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.inserted, 0);

    let filter = ProductFilter::month_only(None).unwrap();
    assert_eq!(store.count_rows(&filter).await.unwrap(), 1);
}
