//! Perplexity citation extraction
//!
//! Perplexity responses carry two overlapping lists: `search_results`
//! (structured: URL, title, snippet) and `citations` (bare URLs). Search
//! results are authoritative since they carry context text; bare citation
//! URLs are appended only when no search result already covers that URL.
//! The merge is deterministic: N distinct entries yield N citations.

use super::{domain_of, CitationShaper};
use crate::types::{Citation, PerplexityPayload, Provider};
use std::collections::HashSet;

pub(super) fn extract(payload: &PerplexityPayload, shaper: &CitationShaper<'_>) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations = Vec::with_capacity(payload.search_results.len() + payload.citations.len());

    for result in &payload.search_results {
        seen.insert(result.url.as_str());
        citations.push(shaper.shape(
            Provider::Perplexity,
            &result.url,
            &result.snippet,
            &result.title,
        ));
    }

    for url in &payload.citations {
        if !seen.insert(url.as_str()) {
            continue;
        }
        // Bare URL: no snippet, so the domain stands in as the source label
        let source = domain_of(url).unwrap_or_default();
        citations.push(shaper.shape(Provider::Perplexity, url, "", &source));
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{test_brand, test_ctx};
    use crate::types::PerplexitySearchResult;

    #[test]
    fn test_bare_citations_yield_one_record_each() {
        let brand = test_brand();
        let ctx = test_ctx();
        let shaper = CitationShaper::new(&ctx, &brand);

        let payload = PerplexityPayload {
            content: "Answer".to_string(),
            citations: vec![
                "https://acme.com/a".to_string(),
                "https://example.org/b".to_string(),
                "https://example.net/c".to_string(),
            ],
            search_results: vec![],
        };

        let citations = extract(&payload, &shaper);
        assert_eq!(citations.len(), 3);
        assert!(citations.iter().all(|c| c.provider == Provider::Perplexity));
        assert_eq!(citations[0].source, "acme.com");
    }

    #[test]
    fn test_search_results_take_precedence_over_bare_urls() {
        let brand = test_brand();
        let ctx = test_ctx();
        let shaper = CitationShaper::new(&ctx, &brand);

        let payload = PerplexityPayload {
            content: "Answer".to_string(),
            citations: vec![
                "https://acme.com/a".to_string(),
                "https://example.org/b".to_string(),
            ],
            search_results: vec![PerplexitySearchResult {
                url: "https://acme.com/a".to_string(),
                title: "Acme widgets".to_string(),
                snippet: "Acme Corp widget lineup".to_string(),
            }],
        };

        let citations = extract(&payload, &shaper);
        // One structured result + one uncovered bare URL
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].text, "Acme Corp widget lineup");
        assert!(citations[0].is_brand_mention);
        assert_eq!(citations[1].url, "https://example.org/b");
        assert_eq!(citations[1].text, "");
    }
}
