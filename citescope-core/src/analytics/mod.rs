//! Analytics for citescope
//!
//! Rolls per-query analyses up into Layer 2 snapshots:
//! - Brand aggregation (totals, provider breakdowns, visibility, insights)
//! - Competitor rollups (per-competitor stats, intensity/position labels)
//! - Share of voice (normalized percentages, ranked leaderboard)
//!
//! Every computation here is a pure function of its inputs; the only
//! stateful piece is the `ensure_report` orchestration, which consults the
//! digest-keyed snapshot cache before recomputing from the persisted
//! history.

pub mod aggregate;
pub mod competitors;
pub mod sov;

pub use aggregate::{
    aggregate, BrandSnapshot, ProviderStats, SnapshotInsights, SnapshotScope, TrendDirection,
};
pub use competitors::{
    aggregate_competitors, CompetitorInsights, CompetitorSnapshot, CompetitorStats,
};
pub use sov::{
    compute_share_of_voice, CompetitiveIntensity, CompetitorMentions, MarketPosition,
    RankedEntity, ShareOfVoice,
};

use crate::analyzer::{analyze_history, QueryAnalysis};
use crate::cache::{history_digest, CachedSnapshot};
use crate::db::Database;
use crate::error::Result;
use crate::types::{Brand, Competitor, QueryRecord};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Combined analytics output for one scope: the three snapshots the
/// presentation layer consumes together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub brand: BrandSnapshot,
    pub competitors: CompetitorSnapshot,
    pub share_of_voice: ShareOfVoice,
}

/// Compute a full report from already-analyzed queries. Pure.
pub fn compute_report(
    scope: SnapshotScope,
    analyses: &[QueryAnalysis],
    brand: &Brand,
    competitors: &[Competitor],
) -> AnalyticsReport {
    let brand_snapshot = aggregate(scope, analyses);
    let competitor_snapshot = aggregate_competitors(
        scope,
        analyses,
        competitors,
        brand_snapshot.total_brand_mentions,
    );
    let mentions: Vec<CompetitorMentions> = competitor_snapshot
        .competitors
        .iter()
        .map(|c| CompetitorMentions {
            name: c.name.clone(),
            mentions: c.total_mentions,
        })
        .collect();
    let share_of_voice = compute_share_of_voice(
        &brand.name,
        brand_snapshot.total_brand_mentions,
        &mentions,
    );

    AnalyticsReport {
        brand: brand_snapshot,
        competitors: competitor_snapshot,
        share_of_voice,
    }
}

/// Ensure a report for the given scope is computed and current.
///
/// Resolution order:
/// 1. A cache entry younger than `ttl` is returned as-is (stale within the
///    TTL window is an accepted tradeoff, not a correctness requirement).
/// 2. A cache entry whose digest matches the current history is returned
///    without recomputing, regardless of age.
/// 3. Otherwise the report is recomputed from the persisted history and the
///    cache entry replaced.
///
/// Lifetime reports are always rederived from the full history; nothing is
/// computed incrementally from a prior cached value, so edits or deletions
/// of historical records can never leave drift behind.
pub fn ensure_report(
    db: &Database,
    brand: &Brand,
    competitors: &[Competitor],
    scope: SnapshotScope,
    ttl: Duration,
) -> Result<AnalyticsReport> {
    let cached = db.get_cached_snapshot(&brand.id, scope)?;

    if let Some(entry) = &cached {
        if entry.is_fresh(ttl) {
            if let Some(report) = parse_cached(entry, &brand.id, scope) {
                tracing::debug!(brand_id = brand.id, scope = scope.as_str(), "Using fresh cached report");
                return Ok(report);
            }
        }
    }

    let history = db.list_query_records(&brand.id)?;
    let digest = history_digest(&history);

    if let Some(entry) = &cached {
        if entry.digest == digest {
            if let Some(report) = parse_cached(entry, &brand.id, scope) {
                tracing::debug!(
                    brand_id = brand.id,
                    scope = scope.as_str(),
                    "History unchanged, reusing cached report"
                );
                return Ok(report);
            }
        }
    }

    tracing::info!(
        brand_id = brand.id,
        scope = scope.as_str(),
        history_len = history.len(),
        "Computing analytics report"
    );

    let slice = scope_slice(db, brand, scope, &history)?;
    let analyses = analyze_history(slice, brand, competitors);
    let mut report = compute_report(scope, &analyses, brand, competitors);

    if scope == SnapshotScope::Latest {
        report.brand.insights.mention_trend =
            previous_session_trend(db, brand, competitors, &history, &report.brand)?;
    }

    let entry = CachedSnapshot {
        digest,
        computed_at: Utc::now(),
        payload: serde_json::to_value(&report)?,
    };
    db.upsert_cached_snapshot(&brand.id, scope, &entry)?;

    Ok(report)
}

/// Slice the history down to the scope's queries.
fn scope_slice<'a>(
    db: &Database,
    brand: &Brand,
    scope: SnapshotScope,
    history: &'a [QueryRecord],
) -> Result<&'a [QueryRecord]> {
    match scope {
        SnapshotScope::Lifetime => Ok(history),
        SnapshotScope::Latest => {
            let Some(session) = db.latest_session(&brand.id)? else {
                return Ok(&[]);
            };
            // History is ordered chronologically, so a session's records
            // form a contiguous run.
            let start = history
                .iter()
                .position(|r| r.session_id == session.id)
                .unwrap_or(history.len());
            let end = history[start..]
                .iter()
                .position(|r| r.session_id != session.id)
                .map(|offset| start + offset)
                .unwrap_or(history.len());
            Ok(&history[start..end])
        }
    }
}

/// Trend against the immediately prior session, when one exists.
fn previous_session_trend(
    db: &Database,
    brand: &Brand,
    competitors: &[Competitor],
    history: &[QueryRecord],
    current: &BrandSnapshot,
) -> Result<Option<TrendDirection>> {
    let sessions = db.list_recent_sessions(&brand.id, 2)?;
    let Some(previous) = sessions.get(1) else {
        return Ok(None);
    };

    let records: Vec<QueryRecord> = history
        .iter()
        .filter(|r| r.session_id == previous.id)
        .cloned()
        .collect();
    let analyses = analyze_history(&records, brand, competitors);
    let previous_snapshot = aggregate(SnapshotScope::Latest, &analyses);

    Ok(Some(TrendDirection::between(&previous_snapshot, current)))
}

fn parse_cached(
    entry: &CachedSnapshot,
    brand_id: &str,
    scope: SnapshotScope,
) -> Option<AnalyticsReport> {
    match serde_json::from_value(entry.payload.clone()) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(
                brand_id,
                scope = scope.as_str(),
                error = %e,
                "Cached report failed to deserialize; recomputing"
            );
            None
        }
    }
}
