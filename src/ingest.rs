//! Ingestion orchestration.
//!
//! Coordinates the one-time startup flow: fetch the upstream catalog,
//! normalize each record, and upsert it into the store. Rows whose id
//! already exists are skipped, never rewritten, so re-running ingestion is
//! safe and leaves the first-inserted payloads untouched.
//!
//! A failed fetch is tolerated: the store simply stays as it was (possibly
//! empty) and the process carries on. Serving is gated on this pass
//! completing, so readers never race the writer.

use anyhow::Result;

use crate::config::Config;
use crate::connector_http::{CatalogSource, HttpCatalogSource};
use crate::db;
use crate::migrate;
use crate::store::CatalogStore;

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub fetched: u64,
    pub inserted: u64,
    pub skipped: u64,
}

/// Run a full ingestion pass against the configured HTTP source and print
/// a summary. Used by both `sfa ingest` and server startup.
pub async fn run_ingest(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    migrate::run_migrations(&pool).await?;

    let store = CatalogStore::new(pool.clone());
    let source = HttpCatalogSource::new(config.catalog.clone());
    let summary = ingest_from_source(&store, &source).await?;

    println!("ingest {}", source.name());
    println!("  fetched: {} records", summary.fetched);
    println!("  inserted: {}", summary.inserted);
    println!("  skipped existing: {}", summary.skipped);
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Fetch from `source` and upsert every record, counting inserts and
/// skips. Zero records is a valid, non-fatal outcome; so is a fetch that
/// fails outright after its retries.
pub async fn ingest_from_source(
    store: &CatalogStore,
    source: &dyn CatalogSource,
) -> Result<IngestSummary> {
    let records = match source.fetch().await {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(source = source.name(), error = %err, "catalog fetch failed; keeping existing rows");
            Vec::new()
        }
    };

    let fetched = records.len() as u64;
    let mut inserted = 0u64;
    let mut skipped = 0u64;

    for record in records {
        let product = record.into_product();
        if store.upsert_if_absent(&product).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    store
        .record_ingest(fetched as i64, inserted as i64, skipped as i64)
        .await?;

    tracing::info!(fetched, inserted, skipped, "ingestion pass complete");

    Ok(IngestSummary {
        fetched,
        inserted,
        skipped,
    })
}
