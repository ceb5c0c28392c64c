//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- LAYER 1: Canonical (lossless)
    -- ============================================

    CREATE TABLE IF NOT EXISTS brands (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        domain           TEXT,
        aliases          JSON NOT NULL,
        created_at       DATETIME NOT NULL,
        metadata         JSON
    );

    CREATE TABLE IF NOT EXISTS competitors (
        id               TEXT PRIMARY KEY,
        brand_id         TEXT NOT NULL REFERENCES brands(id),
        name             TEXT NOT NULL,
        domain           TEXT,
        aliases          JSON NOT NULL,
        created_at       DATETIME NOT NULL,

        UNIQUE(brand_id, name)
    );

    CREATE TABLE IF NOT EXISTS processing_sessions (
        id               TEXT PRIMARY KEY,
        brand_id         TEXT NOT NULL REFERENCES brands(id),
        started_at       DATETIME NOT NULL,
        completed_at     DATETIME
    );

    -- Append-only: the analytics engine only ever reads this table
    CREATE TABLE IF NOT EXISTS query_results (
        id               TEXT PRIMARY KEY,
        brand_id         TEXT NOT NULL REFERENCES brands(id),
        session_id       TEXT NOT NULL REFERENCES processing_sessions(id),
        query            TEXT NOT NULL,
        submitted_at     DATETIME NOT NULL,

        -- Normalized per-provider outcomes
        results          JSON NOT NULL,

        -- Lossless capture of the original provider responses
        raw_data         JSON NOT NULL
    );

    -- ============================================
    -- LAYER 2: Derived (regenerable)
    -- ============================================

    CREATE TABLE IF NOT EXISTS snapshot_cache (
        brand_id         TEXT NOT NULL REFERENCES brands(id),
        scope            TEXT NOT NULL,      -- 'latest', 'lifetime'
        digest           TEXT NOT NULL,      -- SHA-256 of the source history
        payload          JSON NOT NULL,
        computed_at      DATETIME NOT NULL,

        UNIQUE(brand_id, scope)
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_competitors_brand ON competitors(brand_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_brand ON processing_sessions(brand_id, started_at DESC);
    CREATE INDEX IF NOT EXISTS idx_query_results_brand ON query_results(brand_id, submitted_at);
    CREATE INDEX IF NOT EXISTS idx_query_results_session ON query_results(session_id);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
