//! Snapshot cache identity
//!
//! Reports are cached per brand and scope. A cache entry carries the SHA-256
//! digest of the exact query history it was computed from; an entry is
//! reusable only when that digest matches the current history (or within a
//! short TTL, when the digest check itself is skipped). The persisted copy
//! is always rederivable from source history: cache, never source of truth.

use crate::types::QueryRecord;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// Default freshness window during which a cached report is served without
/// re-checking the history digest.
pub const DEFAULT_TTL_MINUTES: i64 = 5;

/// A persisted analytics report plus the identity of its inputs.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    /// Digest of the query history the payload was computed from
    pub digest: String,
    /// When the payload was computed
    pub computed_at: DateTime<Utc>,
    /// The serialized report
    pub payload: serde_json::Value,
}

impl CachedSnapshot {
    /// Whether this entry is within the freshness window.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now().signed_duration_since(self.computed_at) < ttl
    }
}

/// Digest identifying an ordered query history.
///
/// Covers record identity and submission time, so appends, deletions,
/// edits, and reorderings all change the digest.
pub fn history_digest(records: &[QueryRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.submitted_at.to_rfc3339().as_bytes());
        hasher.update([0u8]);
    }
    hasher.update((records.len() as u64).to_le_bytes());
    hex::encode(hasher.finalize())
}
