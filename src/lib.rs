//! # Storefront Analytics
//!
//! A small e-commerce analytics backend: it ingests a product catalog from
//! a third-party JSON feed, persists it in SQLite, and exposes read
//! endpoints for paginated search and aggregate statistics (sales totals,
//! price-range histograms, category breakdowns) filterable by calendar
//! month.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌──────────┐
//! │ HTTP feed   │──▶│  Ingestion │──▶│  SQLite   │
//! │ (upstream)  │   │ (startup)  │   │ products  │
//! └─────────────┘   └────────────┘   └────┬─────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │  (sfa)   │       │  (axum)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! Ingestion completes before the server binds, so every query operation
//! is a pure read against a settled store.
//!
//! ## Quick Start
//!
//! ```bash
//! sfa init                      # create database
//! sfa ingest                    # fetch and persist the catalog
//! sfa stats                     # summarize what's stored
//! sfa serve                     # ingest, then serve the analytics API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`filter`] | Shared month/search predicate builder |
//! | [`store`] | Catalog store over SQLite |
//! | [`query`] | The five read operations |
//! | [`connector_http`] | Third-party catalog fetch with retry |
//! | [`ingest`] | Ingestion orchestration |
//! | [`server`] | Analytics HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod connector_http;
pub mod db;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod query;
pub mod server;
pub mod stats;
pub mod store;
