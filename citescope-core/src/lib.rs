//! # citescope-core
//!
//! Core library for citescope - brand-mention analytics across AI answer
//! engines (ChatGPT Search, Google AI Overview, Perplexity).
//!
//! This library provides:
//! - Domain types for brands, competitors, citations, and query results
//! - Per-provider citation extraction and text mention matching
//! - Cumulative analytics: visibility, share of voice, competitor rollups
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Layer 0 (Raw):** Provider responses as returned, preserved as `raw_data`
//! - **Layer 1 (Canonical):** Normalized SQLite tables, append-only query history
//! - **Layer 2 (Derived):** Computed snapshots and cached reports (regenerable)
//!
//! ## Example
//!
//! ```rust,no_run
//! use citescope_core::analytics::{ensure_report, SnapshotScope};
//! use citescope_core::{Config, Database};
//!
//! # fn main() -> citescope_core::Result<()> {
//! let config = Config::load()?;
//! let db = Database::open(&config.database_path())?;
//! db.migrate()?;
//!
//! let brand = db.require_brand("brand-id")?;
//! let competitors = db.list_competitors(&brand.id)?;
//! let report = ensure_report(
//!     &db,
//!     &brand,
//!     &competitors,
//!     SnapshotScope::Lifetime,
//!     config.analytics.cache_ttl(),
//! )?;
//! println!("visibility: {}%", report.brand.brand_visibility_score);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsReport, BrandSnapshot, CompetitorSnapshot, ShareOfVoice, SnapshotScope};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod analyzer;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod matcher;
pub mod types;
