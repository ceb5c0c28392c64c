//! Database repository layer
//!
//! Provides query and insert operations for all entity types. The query
//! history is append-only from this layer's perspective: records are
//! inserted once and only ever read back, in chronological order.

use crate::analytics::SnapshotScope;
use crate::cache::CachedSnapshot;
use crate::error::{Error, Result};
use crate::types::{Brand, Competitor, ProcessingSession, ProviderResult, QueryRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Brand operations
    // ============================================

    /// Insert or update a brand
    pub fn upsert_brand(&self, brand: &Brand) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO brands (id, name, domain, aliases, created_at, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                domain = excluded.domain,
                aliases = excluded.aliases,
                metadata = excluded.metadata
            "#,
            params![
                brand.id,
                brand.name,
                brand.domain,
                serde_json::to_string(&brand.aliases)?,
                brand.created_at.to_rfc3339(),
                brand.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get a brand by ID
    pub fn get_brand(&self, id: &str) -> Result<Option<Brand>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM brands WHERE id = ?", [id], Self::row_to_brand)
            .optional()
            .map_err(Error::from)
    }

    /// Get a brand by ID, failing when it does not exist
    pub fn require_brand(&self, id: &str) -> Result<Brand> {
        self.get_brand(id)?
            .ok_or_else(|| Error::BrandNotFound(id.to_string()))
    }

    fn row_to_brand(row: &Row) -> rusqlite::Result<Brand> {
        let aliases_str: String = row.get("aliases")?;
        let created_at_str: String = row.get("created_at")?;
        let metadata_str: Option<String> = row.get("metadata")?;

        Ok(Brand {
            id: row.get("id")?,
            name: row.get("name")?,
            domain: row.get("domain")?,
            aliases: serde_json::from_str(&aliases_str).unwrap_or_default(),
            created_at: parse_datetime(&created_at_str),
            metadata: metadata_str
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(serde_json::json!({})),
        })
    }

    // ============================================
    // Competitor operations
    // ============================================

    /// Add a competitor to a brand's tracked set.
    ///
    /// Fails on a duplicate name within the same brand (UNIQUE constraint).
    pub fn insert_competitor(&self, competitor: &Competitor) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO competitors (id, brand_id, name, domain, aliases, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                competitor.id,
                competitor.brand_id,
                competitor.name,
                competitor.domain,
                serde_json::to_string(&competitor.aliases)?,
                competitor.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Remove a competitor by ID
    pub fn delete_competitor(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM competitors WHERE id = ?", [id])?;
        Ok(())
    }

    /// List a brand's competitors in the order they were added
    pub fn list_competitors(&self, brand_id: &str) -> Result<Vec<Competitor>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM competitors WHERE brand_id = ? ORDER BY created_at, rowid",
        )?;
        let competitors = stmt
            .query_map([brand_id], Self::row_to_competitor)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(competitors)
    }

    fn row_to_competitor(row: &Row) -> rusqlite::Result<Competitor> {
        let aliases_str: String = row.get("aliases")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(Competitor {
            id: row.get("id")?,
            brand_id: row.get("brand_id")?,
            name: row.get("name")?,
            domain: row.get("domain")?,
            aliases: serde_json::from_str(&aliases_str).unwrap_or_default(),
            created_at: parse_datetime(&created_at_str),
        })
    }

    // ============================================
    // Processing session operations
    // ============================================

    /// Record the start of a processing session
    pub fn insert_session(&self, session: &ProcessingSession) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO processing_sessions (id, brand_id, started_at, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.id,
                session.brand_id,
                session.started_at.to_rfc3339(),
                session.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Mark a session completed
    pub fn complete_session(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE processing_sessions SET completed_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// The most recently started session for a brand
    pub fn latest_session(&self, brand_id: &str) -> Result<Option<ProcessingSession>> {
        Ok(self.list_recent_sessions(brand_id, 1)?.into_iter().next())
    }

    /// Sessions for a brand, most recently started first
    pub fn list_recent_sessions(
        &self,
        brand_id: &str,
        limit: usize,
    ) -> Result<Vec<ProcessingSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM processing_sessions WHERE brand_id = ?1
             ORDER BY started_at DESC, rowid DESC LIMIT ?2",
        )?;
        let sessions = stmt
            .query_map(params![brand_id, limit as i64], Self::row_to_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<ProcessingSession> {
        let started_at_str: String = row.get("started_at")?;
        let completed_at_str: Option<String> = row.get("completed_at")?;

        Ok(ProcessingSession {
            id: row.get("id")?,
            brand_id: row.get("brand_id")?,
            started_at: parse_datetime(&started_at_str),
            completed_at: completed_at_str
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    // ============================================
    // Query result operations (append-only)
    // ============================================

    /// Append one query's results to the history
    pub fn insert_query_record(&self, record: &QueryRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO query_results (id, brand_id, session_id, query, submitted_at, results, raw_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.brand_id,
                record.session_id,
                record.query,
                record.submitted_at.to_rfc3339(),
                serde_json::to_string(&record.results)?,
                record.raw_data.to_string(),
            ],
        )?;
        Ok(())
    }

    /// A brand's full query history in processing order: chronological by
    /// submission time, ties broken by insertion order.
    ///
    /// A record whose stored results no longer deserialize (e.g. written by
    /// a newer provider the engine does not know) is kept in the history
    /// with empty results, so it contributes zero without aborting the read.
    pub fn list_query_records(&self, brand_id: &str) -> Result<Vec<QueryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM query_results WHERE brand_id = ? ORDER BY submitted_at, rowid",
        )?;
        let records = stmt
            .query_map([brand_id], Self::row_to_query_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn row_to_query_record(row: &Row) -> rusqlite::Result<QueryRecord> {
        let id: String = row.get("id")?;
        let submitted_at_str: String = row.get("submitted_at")?;
        let results_str: String = row.get("results")?;
        let raw_data_str: String = row.get("raw_data")?;

        // Per-result parsing: one unreadable provider entry (e.g. written
        // by a newer provider this engine does not know) drops only that
        // entry, never the record's other providers.
        let results: Vec<ProviderResult> = match serde_json::from_str::<Vec<serde_json::Value>>(
            &results_str,
        ) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|value| match serde_json::from_value(value) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        tracing::warn!(
                            query_id = id,
                            error = %e,
                            "Skipping unreadable provider result"
                        );
                        None
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!(
                    query_id = id,
                    error = %e,
                    "Stored query results failed to deserialize; treating as empty"
                );
                Vec::new()
            }
        };

        Ok(QueryRecord {
            id,
            brand_id: row.get("brand_id")?,
            session_id: row.get("session_id")?,
            query: row.get("query")?,
            submitted_at: parse_datetime(&submitted_at_str),
            results,
            raw_data: serde_json::from_str(&raw_data_str).unwrap_or(serde_json::json!({})),
        })
    }

    // ============================================
    // Snapshot cache operations (Layer 2)
    // ============================================

    /// Fetch the cached report for a brand and scope
    pub fn get_cached_snapshot(
        &self,
        brand_id: &str,
        scope: SnapshotScope,
    ) -> Result<Option<CachedSnapshot>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT digest, payload, computed_at FROM snapshot_cache
             WHERE brand_id = ?1 AND scope = ?2",
            params![brand_id, scope.as_str()],
            |row| {
                let digest: String = row.get("digest")?;
                let payload_str: String = row.get("payload")?;
                let computed_at_str: String = row.get("computed_at")?;
                Ok(CachedSnapshot {
                    digest,
                    computed_at: parse_datetime(&computed_at_str),
                    payload: serde_json::from_str(&payload_str)
                        .unwrap_or(serde_json::json!(null)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    /// Store (or replace) the cached report for a brand and scope
    pub fn upsert_cached_snapshot(
        &self,
        brand_id: &str,
        scope: SnapshotScope,
        entry: &CachedSnapshot,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO snapshot_cache (brand_id, scope, digest, payload, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(brand_id, scope) DO UPDATE SET
                digest = excluded.digest,
                payload = excluded.payload,
                computed_at = excluded.computed_at
            "#,
            params![
                brand_id,
                scope.as_str(),
                entry.digest,
                entry.payload.to_string(),
                entry.computed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
