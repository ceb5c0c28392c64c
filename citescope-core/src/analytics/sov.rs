//! Share-of-voice calculation
//!
//! Combines the brand's aggregate mention count with every tracked
//! competitor's into normalized percentages and a ranked leaderboard.
//!
//! Both percentages are rounded independently; they may sum to 99 or 101
//! and are deliberately not corrected to force an exact 100.

use serde::{Deserialize, Serialize};

/// Qualitative read of how crowded the competitive field is.
///
/// Thresholds on the competitor share are fixed (≤30 low, ≤60 medium,
/// else high), matching the constants embedded in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitiveIntensity {
    Low,
    Medium,
    High,
}

impl CompetitiveIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitiveIntensity::Low => "low",
            CompetitiveIntensity::Medium => "medium",
            CompetitiveIntensity::High => "high",
        }
    }

    /// Classify from the competitors' combined share percentage.
    pub fn from_competitor_share(share_pct: i64) -> Self {
        if share_pct <= 30 {
            CompetitiveIntensity::Low
        } else if share_pct <= 60 {
            CompetitiveIntensity::Medium
        } else {
            CompetitiveIntensity::High
        }
    }
}

/// Qualitative market position of the brand.
///
/// Fixed thresholds on the competitor share: <20 leader, <50 challenger,
/// else follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    Leader,
    Challenger,
    Follower,
}

impl MarketPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketPosition::Leader => "leader",
            MarketPosition::Challenger => "challenger",
            MarketPosition::Follower => "follower",
        }
    }

    /// Classify from the competitors' combined share percentage.
    pub fn from_competitor_share(share_pct: i64) -> Self {
        if share_pct < 20 {
            MarketPosition::Leader
        } else if share_pct < 50 {
            MarketPosition::Challenger
        } else {
            MarketPosition::Follower
        }
    }
}

/// One competitor's aggregate mention count, as SOV input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorMentions {
    pub name: String,
    pub mentions: i64,
}

/// One row of the share-of-voice leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub name: String,
    pub mentions: i64,
    pub is_brand: bool,
}

/// Share-of-voice breakdown for a brand against its tracked competitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareOfVoice {
    /// Brand's rounded percentage of total market mentions
    pub brand_share_pct: i64,
    /// Competitors' combined rounded percentage
    pub competitor_share_pct: i64,
    /// Brand mentions plus all competitor mentions
    pub total_market_mentions: i64,
    /// Entities with at least one mention, descending by mentions
    pub ranked: Vec<RankedEntity>,
    /// Brand's 1-based position in `ranked`; `None` when the brand has no
    /// mentions in a non-empty market
    pub brand_rank: Option<usize>,
}

/// Compute share of voice from aggregate mention counts.
///
/// Zero total market defaults to full brand voice (100/0, rank 1): with no
/// signal at all there is nothing to share.
pub fn compute_share_of_voice(
    brand_name: &str,
    brand_mentions: i64,
    competitors: &[CompetitorMentions],
) -> ShareOfVoice {
    let competitor_sum: i64 = competitors.iter().map(|c| c.mentions).sum();
    let total_market = brand_mentions + competitor_sum;

    if total_market == 0 {
        return ShareOfVoice {
            brand_share_pct: 100,
            competitor_share_pct: 0,
            total_market_mentions: 0,
            ranked: Vec::new(),
            brand_rank: Some(1),
        };
    }

    let mut ranked: Vec<RankedEntity> = competitors
        .iter()
        .filter(|c| c.mentions > 0)
        .map(|c| RankedEntity {
            name: c.name.clone(),
            mentions: c.mentions,
            is_brand: false,
        })
        .collect();
    if brand_mentions > 0 {
        ranked.push(RankedEntity {
            name: brand_name.to_string(),
            mentions: brand_mentions,
            is_brand: true,
        });
    }
    // Descending by mentions; name breaks ties deterministically
    ranked.sort_by(|a, b| b.mentions.cmp(&a.mentions).then(a.name.cmp(&b.name)));

    let brand_rank = ranked.iter().position(|e| e.is_brand).map(|i| i + 1);

    ShareOfVoice {
        brand_share_pct: super::aggregate::percentage(brand_mentions, total_market),
        competitor_share_pct: super::aggregate::percentage(competitor_sum, total_market),
        total_market_mentions: total_market,
        ranked,
        brand_rank,
    }
}
