//! Catalog overview and health summary.
//!
//! Provides a quick look at what's ingested: row counts, the sold/unsold
//! split, per-category breakdowns, and when the catalog was last
//! refreshed. Used by `sfa stats` to give confidence that ingestion worked
//! as expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::filter::ProductFilter;
use crate::store::CatalogStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    let store = CatalogStore::new(pool.clone());

    let unfiltered = ProductFilter::month_only(None)?;
    let total_products = store.count_rows(&unfiltered).await?;
    let statistics = store.sales_statistics(&unfiltered).await?;
    let categories = store.category_counts(&unfiltered).await?;
    let last_ingest = store.last_ingest().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Storefront Analytics — Catalog Stats");
    println!("====================================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!();
    println!("  Products:      {}", total_products);
    println!("  Sold:          {}", statistics.total_items_sold);
    println!("  Unsold:        {}", statistics.total_items_not_sold);
    println!("  Sales total:   {:.2}", statistics.total_sales);

    match last_ingest {
        Some(entry) => {
            println!();
            println!(
                "  Last ingest:   {} ({} fetched, {} inserted, {} skipped)",
                format_ts_relative(entry.completed_at),
                entry.fetched,
                entry.inserted,
                entry.skipped
            );
        }
        None => {
            println!();
            println!("  Last ingest:   never");
        }
    }

    if !categories.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<28} {:>8}", "CATEGORY", "ITEMS");
        println!("  {}", "-".repeat(38));
        for c in &categories {
            println!("  {:<28} {:>8}", c.category, c.total_items);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
