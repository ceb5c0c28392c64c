//! Citation extraction
//!
//! Each provider returns a differently shaped citation list (ChatGPT:
//! `annotations[]`; Perplexity: `citations[]`/`search_results[]`; Google AI
//! Overview: SERP references). The extractor normalizes all of them into the
//! common [`Citation`] shape.
//!
//! # Error Handling
//!
//! Extraction never fails:
//!
//! - **Unparsable citation URL**: the citation is still emitted with
//!   `domain` absent (and therefore `is_domain_citation == false`).
//!
//! - **Missing titles/snippets**: empty strings, never an error.
//!
//! - **Search-engine self-references**: `google.com` citations are emitted
//!   like any other; filtering them out of analytics views is a
//!   presentation concern (see [`crate::export::external_citations`]).

mod chatgpt;
mod google;
mod perplexity;

use crate::matcher::MentionMatcher;
use crate::types::{Brand, Citation, Provider, ProviderPayload};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Originating-query context attached to every extracted citation.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// The query text
    pub query: &'a str,
    /// The query record ID
    pub query_id: &'a str,
    /// When the provider response was received
    pub retrieved_at: DateTime<Utc>,
}

/// Normalize one provider payload into `Citation` records.
///
/// The match is exhaustive over the payload union: a new provider variant
/// fails compilation here until its extraction is written.
pub fn extract_citations(
    payload: &ProviderPayload,
    ctx: &QueryContext<'_>,
    brand: &Brand,
) -> Vec<Citation> {
    let shaper = CitationShaper::new(ctx, brand);
    match payload {
        ProviderPayload::ChatGpt(p) => chatgpt::extract(p, &shaper),
        ProviderPayload::GoogleAi(p) => google::extract(p, &shaper),
        ProviderPayload::Perplexity(p) => perplexity::extract(p, &shaper),
    }
}

/// Best-effort domain extraction from a URL.
///
/// Returns the lowercased host with any `www.` prefix stripped, or `None`
/// when the URL does not parse as an absolute URL.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str().map(normalize_domain)
}

/// Lowercase a domain and strip the `www.` prefix for comparison.
pub fn normalize_domain(domain: &str) -> String {
    let lowered = domain.to_ascii_lowercase();
    lowered
        .strip_prefix("www.")
        .map(str::to_string)
        .unwrap_or(lowered)
}

/// Shared per-payload state for shaping citations: the query context plus
/// the brand's compiled matcher and normalized domain.
pub(crate) struct CitationShaper<'a> {
    ctx: &'a QueryContext<'a>,
    brand_matcher: MentionMatcher,
    brand_domain: Option<String>,
}

impl<'a> CitationShaper<'a> {
    fn new(ctx: &'a QueryContext<'a>, brand: &Brand) -> Self {
        Self {
            ctx,
            brand_matcher: MentionMatcher::new(&brand.match_target()),
            brand_domain: brand.domain.as_deref().map(normalize_domain),
        }
    }

    /// Build one normalized citation, deriving the domain and brand flags.
    pub(crate) fn shape(
        &self,
        provider: Provider,
        url: &str,
        text: &str,
        source: &str,
    ) -> Citation {
        let domain = domain_of(url);
        if domain.is_none() {
            tracing::debug!(url, "Citation URL did not parse; leaving domain absent");
        }
        let is_domain_citation = match (&domain, &self.brand_domain) {
            (Some(cited), Some(own)) => cited == own,
            _ => false,
        };
        let is_brand_mention =
            self.brand_matcher.is_mentioned(text) || self.brand_matcher.is_mentioned(source);

        Citation {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            domain,
            text: text.to_string(),
            source: source.to_string(),
            provider,
            query: self.ctx.query.to_string(),
            query_id: self.ctx.query_id.to_string(),
            is_brand_mention,
            is_domain_citation,
            produced_at: self.ctx.retrieved_at,
        }
    }
}
