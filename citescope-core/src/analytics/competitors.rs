//! Competitor rollups
//!
//! Folds per-query analyses into per-competitor and field-wide statistics:
//! mention totals, visibility, provider breakdowns, and the qualitative
//! intensity/position labels derived from the competitors' combined share.

use crate::analytics::aggregate::{percentage, SnapshotScope};
use crate::analytics::sov::{CompetitiveIntensity, MarketPosition};
use crate::analyzer::QueryAnalysis;
use crate::types::{Competitor, Provider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for one tracked competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorStats {
    pub name: String,
    pub total_mentions: i64,
    /// Percentage (0-100) of queries mentioning this competitor
    pub visibility_score: i64,
    pub average_mentions_per_query: f64,
    /// Provider mentioning this competitor most; `None` without mentions
    pub top_provider: Option<Provider>,
    /// Mention counts per provider
    pub provider_breakdown: BTreeMap<Provider, i64>,
}

/// Field-wide competitor insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorInsights {
    /// Most-mentioned competitor; ties broken by name
    pub top_competitor: Option<String>,
    pub competitive_intensity: CompetitiveIntensity,
    pub market_position: MarketPosition,
}

/// Aggregated competitor statistics over a history slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub scope: SnapshotScope,
    pub total_competitor_mentions: i64,
    /// Percentage (0-100) of queries mentioning at least one competitor
    pub competitor_visibility_score: i64,
    /// Tracked competitors that were actually mentioned at least once
    pub unique_competitors_detected: i64,
    /// One entry per tracked competitor (zero-mention ones included),
    /// descending by mentions
    pub competitors: Vec<CompetitorStats>,
    pub insights: CompetitorInsights,
}

/// Fold per-query analyses into a competitor snapshot.
///
/// `brand_mentions` is the brand's own aggregate mention count for the same
/// slice; the intensity/position labels come from the share split between
/// the brand and the combined competitor field.
pub fn aggregate_competitors(
    scope: SnapshotScope,
    analyses: &[QueryAnalysis],
    competitors: &[Competitor],
    brand_mentions: i64,
) -> CompetitorSnapshot {
    let total_queries = analyses.len() as i64;

    #[derive(Default)]
    struct Tally {
        mentions: i64,
        queries_with_mention: i64,
        by_provider: BTreeMap<Provider, i64>,
    }

    let mut tallies: BTreeMap<&str, Tally> = competitors
        .iter()
        .map(|c| (c.name.as_str(), Tally::default()))
        .collect();
    let mut queries_with_any: i64 = 0;

    for analysis in analyses {
        let mut any_this_query = false;
        for (name, tally) in tallies.iter_mut() {
            let mut count: i64 = 0;
            for provider_analysis in &analysis.providers {
                if let Some(stats) = provider_analysis.competitors.get(*name) {
                    if stats.mention_count > 0 {
                        count += stats.mention_count as i64;
                        *tally.by_provider.entry(provider_analysis.provider).or_insert(0) +=
                            stats.mention_count as i64;
                    }
                }
            }
            if count > 0 {
                tally.mentions += count;
                tally.queries_with_mention += 1;
                any_this_query = true;
            }
        }
        if any_this_query {
            queries_with_any += 1;
        }
    }

    let mut stats: Vec<CompetitorStats> = competitors
        .iter()
        .map(|c| {
            let tally = &tallies[c.name.as_str()];
            let top_provider = tally
                .by_provider
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(provider, _)| *provider);
            CompetitorStats {
                name: c.name.clone(),
                total_mentions: tally.mentions,
                visibility_score: percentage(tally.queries_with_mention, total_queries),
                average_mentions_per_query: if total_queries > 0 {
                    tally.mentions as f64 / total_queries as f64
                } else {
                    0.0
                },
                top_provider,
                provider_breakdown: tally.by_provider.clone(),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.total_mentions.cmp(&a.total_mentions).then(a.name.cmp(&b.name)));

    let total_competitor_mentions: i64 = stats.iter().map(|s| s.total_mentions).sum();
    let unique_competitors_detected = stats.iter().filter(|s| s.total_mentions > 0).count() as i64;
    let top_competitor = stats
        .first()
        .filter(|s| s.total_mentions > 0)
        .map(|s| s.name.clone());

    // Same share split the SOV calculator reports; zero market reads as a
    // 0% competitor share (low intensity, leader) by the same convention.
    let total_market = brand_mentions + total_competitor_mentions;
    let competitor_share_pct = percentage(total_competitor_mentions, total_market);

    CompetitorSnapshot {
        scope,
        total_competitor_mentions,
        competitor_visibility_score: percentage(queries_with_any, total_queries),
        unique_competitors_detected,
        competitors: stats,
        insights: CompetitorInsights {
            top_competitor,
            competitive_intensity: CompetitiveIntensity::from_competitor_share(
                competitor_share_pct,
            ),
            market_position: MarketPosition::from_competitor_share(competitor_share_pct),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{MentionStats, ProviderAnalysis};
    use chrono::{TimeZone, Utc};

    fn competitor(name: &str) -> Competitor {
        Competitor {
            id: format!("comp-{}", name.to_lowercase()),
            brand_id: "brand-1".to_string(),
            name: name.to_string(),
            domain: None,
            aliases: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn analysis(id: usize, per_provider: Vec<(Provider, Vec<(&str, usize)>)>) -> QueryAnalysis {
        QueryAnalysis {
            query_id: format!("query-{}", id),
            query: format!("query {}", id),
            submitted_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            providers: per_provider
                .into_iter()
                .map(|(provider, mentions)| ProviderAnalysis {
                    provider,
                    brand: MentionStats::default(),
                    competitors: mentions
                        .into_iter()
                        .map(|(name, count)| {
                            (
                                name.to_string(),
                                MentionStats {
                                    mentioned: count > 0,
                                    mention_count: count,
                                    citations: vec![],
                                },
                            )
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_per_competitor_rollup() {
        let competitors = vec![competitor("Acme"), competitor("Globex")];
        let analyses = vec![
            analysis(
                0,
                vec![
                    (Provider::ChatGpt, vec![("Acme", 2), ("Globex", 0)]),
                    (Provider::Perplexity, vec![("Acme", 1), ("Globex", 1)]),
                ],
            ),
            analysis(1, vec![(Provider::ChatGpt, vec![("Acme", 0), ("Globex", 0)])]),
        ];

        let snapshot =
            aggregate_competitors(SnapshotScope::Lifetime, &analyses, &competitors, 0);

        assert_eq!(snapshot.total_competitor_mentions, 4);
        assert_eq!(snapshot.unique_competitors_detected, 2);
        assert_eq!(snapshot.competitor_visibility_score, 50);
        assert_eq!(snapshot.insights.top_competitor.as_deref(), Some("Acme"));

        let acme = &snapshot.competitors[0];
        assert_eq!(acme.name, "Acme");
        assert_eq!(acme.total_mentions, 3);
        assert_eq!(acme.visibility_score, 50);
        assert_eq!(acme.top_provider, Some(Provider::ChatGpt));
        assert_eq!(acme.provider_breakdown[&Provider::Perplexity], 1);
    }

    #[test]
    fn test_zero_mention_competitor_still_listed() {
        let competitors = vec![competitor("Acme")];
        let snapshot = aggregate_competitors(SnapshotScope::Latest, &[], &competitors, 0);

        assert_eq!(snapshot.competitors.len(), 1);
        assert_eq!(snapshot.competitors[0].total_mentions, 0);
        assert_eq!(snapshot.competitors[0].top_provider, None);
        assert_eq!(snapshot.unique_competitors_detected, 0);
        assert_eq!(snapshot.insights.top_competitor, None);
    }

    #[test]
    fn test_intensity_and_position_from_share() {
        let competitors = vec![competitor("Acme")];
        let analyses = vec![analysis(
            0,
            vec![(Provider::ChatGpt, vec![("Acme", 9)])],
        )];

        // Brand 1 vs competitors 9: share 90 -> high intensity, follower
        let snapshot = aggregate_competitors(SnapshotScope::Lifetime, &analyses, &competitors, 1);
        assert_eq!(
            snapshot.insights.competitive_intensity,
            CompetitiveIntensity::High
        );
        assert_eq!(snapshot.insights.market_position, MarketPosition::Follower);

        // Brand 91 vs competitors 9: share 9 -> low intensity, leader
        let snapshot = aggregate_competitors(SnapshotScope::Lifetime, &analyses, &competitors, 91);
        assert_eq!(
            snapshot.insights.competitive_intensity,
            CompetitiveIntensity::Low
        );
        assert_eq!(snapshot.insights.market_position, MarketPosition::Leader);
    }
}
