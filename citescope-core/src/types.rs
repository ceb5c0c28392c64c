//! Core domain types for citescope
//!
//! These types represent the canonical data model (Layer 1) that normalizes
//! answer-engine activity for a tracked brand.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Brand** | The company/domain the user owns and monitors |
//! | **Competitor** | A rival company tracked alongside the brand, with name/domain/aliases |
//! | **Provider** | An AI answer engine (ChatGPT Search, Google AI Overview, Perplexity) |
//! | **Citation** | A normalized reference (URL + text) a provider returned pointing to a source |
//! | **Domain Citation** | A citation whose URL's domain matches the brand's own domain |
//! | **Brand Mention** | The brand's name/alias appearing in a provider's generated text |
//! | **Processing Session** | One batch of queries submitted and answered together |
//!
//! ### Provider keys
//!
//! The surrounding system historically keyed Google AI Overview as both
//! `google` and `googleAI` depending on where the record was written. The
//! canonical key in citescope is `google_ai`; [`Provider`]'s `FromStr` and
//! serde impls accept the legacy spellings and fold them onto
//! [`Provider::GoogleAi`] so stored data always round-trips to one key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Providers
// ============================================

/// Supported AI answer engines.
///
/// A closed enum: citation records and provider stats never carry any other
/// key. Variant order matches alphabetical order of the canonical keys, so
/// ordered iteration (e.g. over a `BTreeMap`) is deterministic and matches
/// the tie-break rules used by the aggregator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Provider {
    #[serde(rename = "chatgpt")]
    ChatGpt,
    #[serde(rename = "google_ai", alias = "google", alias = "googleAI")]
    GoogleAi,
    #[serde(rename = "perplexity")]
    Perplexity,
}

impl Provider {
    /// All providers, in canonical key order.
    pub const ALL: [Provider; 3] = [Provider::ChatGpt, Provider::GoogleAi, Provider::Perplexity];

    /// Returns the display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::ChatGpt => "ChatGPT Search",
            Provider::GoogleAi => "Google AI Overview",
            Provider::Perplexity => "Perplexity",
        }
    }

    /// Returns the canonical identifier used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::ChatGpt => "chatgpt",
            Provider::GoogleAi => "google_ai",
            Provider::Perplexity => "perplexity",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chatgpt" | "ChatGpt" => Ok(Provider::ChatGpt),
            "google_ai" | "google" | "googleAI" | "GoogleAi" => Ok(Provider::GoogleAi),
            "perplexity" | "Perplexity" => Ok(Provider::Perplexity),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

// ============================================
// Brand and Competitors
// ============================================

/// The tracked brand: the company the user owns and monitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    /// Unique identifier
    pub id: String,
    /// Brand name as matched against provider text
    pub name: String,
    /// The brand's own domain (e.g. "acme.com"), used for domain-citation checks
    pub domain: Option<String>,
    /// Alternate names/spellings matched alongside the name
    pub aliases: Vec<String>,
    /// When this brand was registered
    pub created_at: DateTime<Utc>,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

impl Brand {
    /// View of this brand as a mention-matching target.
    pub fn match_target(&self) -> MatchTarget<'_> {
        MatchTarget {
            name: &self.name,
            aliases: &self.aliases,
            domain: self.domain.as_deref(),
        }
    }
}

/// A rival company tracked alongside a brand.
///
/// Created by user action during setup or from the competitor page; immutable
/// during analysis. Name is unique within a brand's tracked set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    /// Unique identifier
    pub id: String,
    /// Brand this competitor is tracked under
    pub brand_id: String,
    /// Competitor name as matched against provider text
    pub name: String,
    /// Competitor's domain, if known; without it the competitor never
    /// triggers a domain-citation match
    pub domain: Option<String>,
    /// Alternate names/spellings
    pub aliases: Vec<String>,
    /// When this competitor was added
    pub created_at: DateTime<Utc>,
}

impl Competitor {
    /// View of this competitor as a mention-matching target.
    pub fn match_target(&self) -> MatchTarget<'_> {
        MatchTarget {
            name: &self.name,
            aliases: &self.aliases,
            domain: self.domain.as_deref(),
        }
    }
}

/// Borrowed view of an entity (brand or competitor) for text matching.
#[derive(Debug, Clone, Copy)]
pub struct MatchTarget<'a> {
    /// Primary name
    pub name: &'a str,
    /// Alternate names/spellings
    pub aliases: &'a [String],
    /// Registered domain, if any
    pub domain: Option<&'a str>,
}

// ============================================
// Citations
// ============================================

/// A normalized reference an AI provider returned pointing to a source.
///
/// All three provider payload shapes normalize into this one record.
///
/// Invariants: `provider` is always one of the three supported engines, and
/// `is_domain_citation` implies `domain` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Unique identifier
    pub id: String,
    /// Cited URL as returned by the provider
    pub url: String,
    /// Domain derived from `url`; absent when the URL is unparsable
    pub domain: Option<String>,
    /// Snippet/context text for the citation
    pub text: String,
    /// Human-readable source label
    pub source: String,
    /// Which engine produced this citation
    pub provider: Provider,
    /// Query text this citation answers (weak back-reference)
    pub query: String,
    /// Originating query record ID (weak back-reference, not ownership)
    pub query_id: String,
    /// True when the citation's text/source matches the tracked brand
    pub is_brand_mention: bool,
    /// True when the citation's domain equals the brand's own domain
    pub is_domain_citation: bool,
    /// When the citation was produced
    pub produced_at: DateTime<Utc>,
}

// ============================================
// Provider payloads (Layer 0 shapes)
// ============================================

/// Raw per-provider response payload, as a closed tagged union.
///
/// Each provider returns a differently shaped citation list; modeling the
/// union as an enum keeps the extractor and analyzer exhaustive, so adding a
/// fourth engine is a compile-checked extension rather than a string branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ProviderPayload {
    #[serde(rename = "chatgpt")]
    ChatGpt(ChatGptPayload),
    #[serde(rename = "google_ai", alias = "google", alias = "googleAI")]
    GoogleAi(GoogleAiPayload),
    #[serde(rename = "perplexity")]
    Perplexity(PerplexityPayload),
}

impl ProviderPayload {
    /// Which provider this payload came from.
    pub fn provider(&self) -> Provider {
        match self {
            ProviderPayload::ChatGpt(_) => Provider::ChatGpt,
            ProviderPayload::GoogleAi(_) => Provider::GoogleAi,
            ProviderPayload::Perplexity(_) => Provider::Perplexity,
        }
    }

    /// The generated answer text.
    pub fn content(&self) -> &str {
        match self {
            ProviderPayload::ChatGpt(p) => &p.content,
            ProviderPayload::GoogleAi(p) => &p.content,
            ProviderPayload::Perplexity(p) => &p.content,
        }
    }
}

/// ChatGPT Search response: answer text plus url_citation annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatGptPayload {
    /// Generated answer text
    pub content: String,
    /// URL citation annotations
    pub annotations: Vec<ChatGptAnnotation>,
    /// Whether the model invoked web search for this answer
    pub web_search_used: bool,
}

/// One url_citation annotation from a ChatGPT Search response.
///
/// `start_index`/`end_index` are byte offsets into `content` marking the
/// cited span, when the provider supplied them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatGptAnnotation {
    pub url: String,
    pub title: String,
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
}

/// Google AI Overview response: overview text plus SERP reference list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAiPayload {
    /// Overview text
    pub content: String,
    /// References cited by the overview
    pub references: Vec<GoogleAiReference>,
}

/// One reference from a Google AI Overview SERP payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAiReference {
    pub link: String,
    pub title: String,
    pub snippet: String,
    pub source: String,
}

/// Perplexity response: answer text plus citations and search results.
///
/// `citations` is a bare URL list; `search_results` carries richer entries
/// for (usually) the same sources. Either list may be empty or missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerplexityPayload {
    /// Generated answer text
    pub content: String,
    /// Bare cited URLs
    pub citations: Vec<String>,
    /// Structured search results backing the answer
    pub search_results: Vec<PerplexitySearchResult>,
}

/// One structured search result from a Perplexity response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerplexitySearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

// ============================================
// Query results (Layer 1, append-only)
// ============================================

/// One provider's outcome for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    /// The raw payload, tagged by provider
    pub payload: ProviderPayload,
    /// Whether the provider call succeeded
    pub success: bool,
    /// Error message when the call failed
    #[serde(default)]
    pub error: Option<String>,
    /// Round-trip time of the provider call
    #[serde(default)]
    pub response_time_ms: Option<i64>,
    /// When the response was received
    pub retrieved_at: DateTime<Utc>,
}

impl ProviderResult {
    /// Which provider produced this result.
    pub fn provider(&self) -> Provider {
        self.payload.provider()
    }
}

/// One query's results across up to three providers.
///
/// Produced once per query-processing run and immutable after creation;
/// stored append-only in a per-brand history. `raw_data` preserves the
/// original provider responses losslessly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Unique identifier
    pub id: String,
    /// Brand this query was run for
    pub brand_id: String,
    /// Processing session this query belongs to
    pub session_id: String,
    /// The query text sent to the providers
    pub query: String,
    /// When the query was submitted
    pub submitted_at: DateTime<Utc>,
    /// Per-provider outcomes (absent providers contribute zero)
    pub results: Vec<ProviderResult>,
    /// Complete original responses - never loses data
    pub raw_data: serde_json::Value,
}

/// One batch of queries submitted and answered together.
///
/// "Latest" analytics scope to the most recent session for a brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSession {
    /// Unique identifier
    pub id: String,
    /// Brand this session ran for
    pub brand_id: String,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// When the session finished (if it has)
    pub completed_at: Option<DateTime<Utc>>,
}
