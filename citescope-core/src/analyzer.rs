//! Per-query analysis
//!
//! Takes one query's raw provider results and produces mention/citation
//! stats for the brand and every tracked competitor, independently per
//! provider. A competitor mentioned by Perplexity but not ChatGPT stays
//! that way; nothing is collapsed across providers.
//!
//! Failed or absent provider results contribute zero and do not count as a
//! processed query for that provider's stats.

use crate::extract::{self, normalize_domain, QueryContext};
use crate::matcher::MentionMatcher;
use crate::types::{Brand, Citation, Competitor, Provider, QueryRecord};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Mention/citation stats for one entity under one provider.
///
/// Invariant: `mentioned == (mention_count > 0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentionStats {
    /// Whether the entity's name/alias appeared in the generated text
    pub mentioned: bool,
    /// Occurrences of the entity's name + aliases in the generated text
    pub mention_count: usize,
    /// Citations attributed to the entity for this provider
    pub citations: Vec<Citation>,
}

/// One provider's analysis of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAnalysis {
    /// Which provider answered
    pub provider: Provider,
    /// Brand stats; `citations` holds every citation the provider returned,
    /// each carrying its own brand/domain flags
    pub brand: MentionStats,
    /// Per-competitor stats, keyed by competitor name
    pub competitors: BTreeMap<String, MentionStats>,
}

/// Derived analysis of one query across all providers that answered it.
///
/// Not persisted as a source of truth; always recomputable from the
/// [`QueryRecord`] and the competitor list.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnalysis {
    /// Originating query record ID
    pub query_id: String,
    /// The query text
    pub query: String,
    /// When the query was submitted
    pub submitted_at: DateTime<Utc>,
    /// One entry per provider that successfully answered
    pub providers: Vec<ProviderAnalysis>,
}

impl QueryAnalysis {
    /// Whether any provider mentioned the brand for this query.
    pub fn brand_mentioned(&self) -> bool {
        self.providers.iter().any(|p| p.brand.mentioned)
    }
}

/// Analyze one query record against the brand and its tracked competitors.
pub fn analyze_query(
    record: &QueryRecord,
    brand: &Brand,
    competitors: &[Competitor],
) -> QueryAnalysis {
    let brand_matcher = MentionMatcher::new(&brand.match_target());
    let competitor_matchers: Vec<(&Competitor, MentionMatcher)> = competitors
        .iter()
        .map(|c| (c, MentionMatcher::new(&c.match_target())))
        .collect();

    let mut providers = Vec::new();
    let mut seen: BTreeSet<Provider> = BTreeSet::new();

    for result in &record.results {
        let provider = result.provider();
        if !result.success {
            tracing::debug!(
                query_id = record.id,
                provider = %provider,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Skipping failed provider result"
            );
            continue;
        }
        if !seen.insert(provider) {
            tracing::warn!(
                query_id = record.id,
                provider = %provider,
                "Duplicate provider result in query record; keeping the first"
            );
            continue;
        }

        let ctx = QueryContext {
            query: &record.query,
            query_id: &record.id,
            retrieved_at: result.retrieved_at,
        };
        let content = result.payload.content();
        let citations = extract::extract_citations(&result.payload, &ctx, brand);

        let brand_count = brand_matcher.count_mentions(content);
        let brand_stats = MentionStats {
            mentioned: brand_count > 0,
            mention_count: brand_count,
            citations: citations.clone(),
        };

        let mut competitor_stats = BTreeMap::new();
        for (competitor, matcher) in &competitor_matchers {
            let count = matcher.count_mentions(content);
            let attributed: Vec<Citation> = citations
                .iter()
                .filter(|c| cites_competitor(c, competitor, matcher))
                .cloned()
                .collect();
            competitor_stats.insert(
                competitor.name.clone(),
                MentionStats {
                    mentioned: count > 0,
                    mention_count: count,
                    citations: attributed,
                },
            );
        }

        providers.push(ProviderAnalysis {
            provider,
            brand: brand_stats,
            competitors: competitor_stats,
        });
    }

    QueryAnalysis {
        query_id: record.id.clone(),
        query: record.query.clone(),
        submitted_at: record.submitted_at,
        providers,
    }
}

/// Analyze an ordered history slice; one analysis per record, same order.
pub fn analyze_history(
    records: &[QueryRecord],
    brand: &Brand,
    competitors: &[Competitor],
) -> Vec<QueryAnalysis> {
    records
        .iter()
        .map(|record| analyze_query(record, brand, competitors))
        .collect()
}

/// A citation counts for a competitor when its domain matches the
/// competitor's registered domain or its text/source mentions the
/// competitor. Mirrors how the brand's own citation flags are derived.
fn cites_competitor(citation: &Citation, competitor: &Competitor, matcher: &MentionMatcher) -> bool {
    if let (Some(cited), Some(own)) = (&citation.domain, &competitor.domain) {
        if *cited == normalize_domain(own) {
            return true;
        }
    }
    matcher.is_mentioned(&citation.text) || matcher.is_mentioned(&citation.source)
}
