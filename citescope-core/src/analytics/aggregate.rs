//! Cumulative brand aggregation
//!
//! Folds an ordered sequence of per-query analyses into a snapshot:
//! totals, per-provider breakdowns, visibility score, and insights. The
//! same single pass serves both scopes; "latest" and "lifetime" differ only
//! in the input slice.
//!
//! Visibility semantics: the score is the percentage of queries where the
//! brand was mentioned by at least one provider. The mention-count-weighted
//! signal lives in `insights.average_brand_mentions_per_query` instead, so
//! the two readings never get conflated.

use crate::analyzer::QueryAnalysis;
use crate::types::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which slice of history a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotScope {
    /// The most recent processing session only
    Latest,
    /// The brand's entire query history
    Lifetime,
}

impl SnapshotScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotScope::Latest => "latest",
            SnapshotScope::Lifetime => "lifetime",
        }
    }
}

impl std::str::FromStr for SnapshotScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(SnapshotScope::Latest),
            "lifetime" => Ok(SnapshotScope::Lifetime),
            _ => Err(format!("unknown snapshot scope: {}", s)),
        }
    }
}

/// Per-provider sub-totals.
///
/// `queries_processed` counts queries this provider successfully answered;
/// it can never exceed the snapshot's `total_queries_processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub queries_processed: i64,
    pub brand_mentions: i64,
    pub citations: i64,
    pub domain_citations: i64,
}

/// Direction of the brand's mention trend between two sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Flat => "flat",
        }
    }

    /// Compare two session snapshots, previous vs current.
    ///
    /// Visibility score decides; total mentions break visibility ties. This
    /// replaces the placeholder random arrows the original dashboard showed.
    pub fn between(previous: &BrandSnapshot, current: &BrandSnapshot) -> Self {
        match current
            .brand_visibility_score
            .cmp(&previous.brand_visibility_score)
        {
            std::cmp::Ordering::Greater => TrendDirection::Up,
            std::cmp::Ordering::Less => TrendDirection::Down,
            std::cmp::Ordering::Equal => {
                match current.total_brand_mentions.cmp(&previous.total_brand_mentions) {
                    std::cmp::Ordering::Greater => TrendDirection::Up,
                    std::cmp::Ordering::Less => TrendDirection::Down,
                    std::cmp::Ordering::Equal => TrendDirection::Flat,
                }
            }
        }
    }
}

/// Derived insights attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInsights {
    /// Mean brand mentions per processed query (0 when no queries)
    pub average_brand_mentions_per_query: f64,
    /// Provider with the most brand mentions; `None` when no provider has
    /// any. Ties broken by canonical provider key order.
    pub top_performing_provider: Option<Provider>,
    /// All providers tied for the maximum mention count
    pub top_providers: Vec<Provider>,
    /// Session-over-session trend; filled in by the orchestration layer
    /// when a prior session exists, `None` for a bare aggregation
    pub mention_trend: Option<TrendDirection>,
}

/// Aggregated brand statistics over a history slice.
///
/// Pure value: aggregating the same input twice yields an equal snapshot.
/// `computed_at` bookkeeping lives on the cache entry, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSnapshot {
    /// Which slice of history this covers
    pub scope: SnapshotScope,
    pub total_queries_processed: i64,
    pub total_brand_mentions: i64,
    pub total_citations: i64,
    pub total_domain_citations: i64,
    /// Percentage (0-100) of queries with at least one brand mention
    pub brand_visibility_score: i64,
    /// Sub-totals for each provider that answered at least one query
    pub provider_stats: BTreeMap<Provider, ProviderStats>,
    pub insights: SnapshotInsights,
}

impl BrandSnapshot {
    /// An empty snapshot for the given scope (zero queries, all rates 0).
    pub fn empty(scope: SnapshotScope) -> Self {
        Self {
            scope,
            total_queries_processed: 0,
            total_brand_mentions: 0,
            total_citations: 0,
            total_domain_citations: 0,
            brand_visibility_score: 0,
            provider_stats: BTreeMap::new(),
            insights: SnapshotInsights {
                average_brand_mentions_per_query: 0.0,
                top_performing_provider: None,
                top_providers: Vec::new(),
                mention_trend: None,
            },
        }
    }

    /// Stats for one provider, zero when it never answered.
    pub fn provider(&self, provider: Provider) -> ProviderStats {
        self.provider_stats.get(&provider).copied().unwrap_or_default()
    }
}

/// Round `numerator / denominator` to a whole percentage; 0 when empty.
pub(crate) fn percentage(numerator: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        return 0;
    }
    (100.0 * numerator as f64 / denominator as f64).round() as i64
}

/// Fold per-query analyses into a brand snapshot.
///
/// Single pass, O(queries × providers). Lifetime snapshots must always be
/// fed the full persisted history; never derive one incrementally from a
/// prior cached snapshot.
pub fn aggregate(scope: SnapshotScope, analyses: &[QueryAnalysis]) -> BrandSnapshot {
    let mut snapshot = BrandSnapshot::empty(scope);
    let mut queries_with_mention: i64 = 0;

    for analysis in analyses {
        snapshot.total_queries_processed += 1;
        if analysis.brand_mentioned() {
            queries_with_mention += 1;
        }

        for provider_analysis in &analysis.providers {
            let mentions = provider_analysis.brand.mention_count as i64;
            let citations = provider_analysis.brand.citations.len() as i64;
            let domain_citations = provider_analysis
                .brand
                .citations
                .iter()
                .filter(|c| c.is_domain_citation)
                .count() as i64;

            let stats = snapshot
                .provider_stats
                .entry(provider_analysis.provider)
                .or_default();
            stats.queries_processed += 1;
            stats.brand_mentions += mentions;
            stats.citations += citations;
            stats.domain_citations += domain_citations;

            snapshot.total_brand_mentions += mentions;
            snapshot.total_citations += citations;
            snapshot.total_domain_citations += domain_citations;
        }
    }

    snapshot.brand_visibility_score =
        percentage(queries_with_mention, snapshot.total_queries_processed);

    snapshot.insights.average_brand_mentions_per_query = if snapshot.total_queries_processed > 0 {
        snapshot.total_brand_mentions as f64 / snapshot.total_queries_processed as f64
    } else {
        0.0
    };

    let max_mentions = snapshot
        .provider_stats
        .values()
        .map(|s| s.brand_mentions)
        .max()
        .unwrap_or(0);
    if max_mentions > 0 {
        // BTreeMap iterates in canonical key order, so the first maximum is
        // also the alphabetical tie-break winner.
        snapshot.insights.top_providers = snapshot
            .provider_stats
            .iter()
            .filter(|(_, s)| s.brand_mentions == max_mentions)
            .map(|(p, _)| *p)
            .collect();
        snapshot.insights.top_performing_provider = snapshot.insights.top_providers.first().copied();
    }

    snapshot
}
