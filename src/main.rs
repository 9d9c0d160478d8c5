//! # Storefront Analytics CLI (`sfa`)
//!
//! The `sfa` binary is the primary interface for Storefront Analytics. It
//! provides commands for database initialization, catalog ingestion, a
//! stored-data summary, and the analytics HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! sfa --config ./config/sfa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sfa init` | Create the SQLite database and run schema migrations |
//! | `sfa ingest` | Fetch the third-party catalog and persist new rows |
//! | `sfa stats` | Print a summary of the stored catalog |
//! | `sfa serve` | Run ingestion, then serve the analytics API |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! sfa init --config ./config/sfa.toml
//!
//! # One-off catalog refresh
//! sfa ingest --config ./config/sfa.toml
//!
//! # Full startup: migrate, ingest, serve
//! sfa serve --config ./config/sfa.toml
//!
//! # Serve whatever is already stored, skipping the fetch
//! sfa serve --skip-ingest --config ./config/sfa.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use storefront_analytics::{config, connector_http, db, ingest, migrate, query, server, stats, store};

/// Storefront Analytics CLI — catalog ingestion and month-filtered sales
/// analytics over SQLite.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sfa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sfa",
    about = "Storefront Analytics — catalog ingestion and sales analytics API",
    version,
    long_about = "Storefront Analytics ingests a product catalog from a third-party JSON feed \
    into SQLite and exposes paginated search and aggregate statistics (sales totals, price-range \
    histograms, category breakdowns) filterable by calendar month."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sfa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `products` and
    /// `ingest_log` tables. Idempotent — running it multiple times is
    /// safe.
    Init,

    /// Fetch the third-party catalog and persist it.
    ///
    /// Rows whose id already exists are skipped, never updated, so
    /// repeated runs leave existing data untouched.
    Ingest,

    /// Print a summary of the stored catalog.
    Stats,

    /// Start the analytics HTTP server.
    ///
    /// Runs migrations and a full ingestion pass first; the listener only
    /// binds once the store has settled.
    Serve {
        /// Serve the existing database without fetching the catalog.
        #[arg(long)]
        skip_ingest: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.db).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest => {
            ingest::run_ingest(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { skip_ingest } => {
            let pool = db::connect(&cfg.db).await?;
            migrate::run_migrations(&pool).await?;

            let catalog = store::CatalogStore::new(pool.clone());
            if skip_ingest {
                tracing::info!("skipping catalog ingestion, serving existing rows");
            } else {
                let source = connector_http::HttpCatalogSource::new(cfg.catalog.clone());
                let summary = ingest::ingest_from_source(&catalog, &source).await?;
                println!(
                    "ingested catalog: {} fetched, {} inserted, {} skipped",
                    summary.fetched, summary.inserted, summary.skipped
                );
            }

            let engine = query::QueryEngine::new(catalog);
            server::run_server(&cfg, engine).await?;
        }
    }

    Ok(())
}
