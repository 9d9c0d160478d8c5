use anyhow::Result;
use sqlx::SqlitePool;

/// Idempotent schema setup. `id` is the externally assigned catalog key;
/// the primary key constraint is what makes `INSERT OR IGNORE` drop
/// duplicate ids during ingestion.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            price REAL NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            image_url TEXT NOT NULL,
            sold INTEGER NOT NULL DEFAULT 0,
            date_of_sale TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fetched INTEGER NOT NULL,
            inserted INTEGER NOT NULL,
            skipped INTEGER NOT NULL,
            completed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_date_of_sale ON products(date_of_sale)")
        .execute(pool)
        .await?;

    Ok(())
}
