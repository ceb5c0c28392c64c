//! Citation export
//!
//! Tabular CSV output of citation records for download from the dashboard,
//! plus the presentation-layer filter that drops the search engine's own
//! domain from citation views.

use crate::error::{Error, Result};
use crate::types::Citation;
use std::io::Write;

/// Domains that represent an answer engine itself rather than a cited
/// source; filtered from presentation views, never from extraction.
const SELF_REFERENCE_DOMAINS: &[&str] = &["google.com"];

/// Citations suitable for analytics/tabular views: everything except the
/// engines' self-references.
pub fn external_citations(citations: &[Citation]) -> Vec<&Citation> {
    citations
        .iter()
        .filter(|c| match &c.domain {
            Some(domain) => !SELF_REFERENCE_DOMAINS.contains(&domain.as_str()),
            None => true,
        })
        .collect()
}

/// Write citations as UTF-8 CSV, one row per citation.
///
/// The `csv` crate handles quoting/escaping of fields containing commas,
/// quotes, or newlines.
pub fn write_citations_csv<W: Write>(writer: W, citations: &[Citation]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "Query",
        "Platform",
        "Source",
        "Citation Text",
        "URL",
        "Domain",
        "Brand Mention",
        "Domain Citation",
        "Timestamp",
    ])?;

    for citation in citations {
        let produced_at = citation.produced_at.to_rfc3339();
        wtr.write_record([
            citation.query.as_str(),
            citation.provider.display_name(),
            citation.source.as_str(),
            citation.text.as_str(),
            citation.url.as_str(),
            citation.domain.as_deref().unwrap_or(""),
            yes_no(citation.is_brand_mention),
            yes_no(citation.is_domain_citation),
            produced_at.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render citations as a CSV string.
pub fn citations_to_csv(citations: &[Citation]) -> Result<String> {
    let mut buffer = Vec::new();
    write_citations_csv(&mut buffer, citations)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Config(format!("citation export produced invalid UTF-8: {}", e)))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;
    use chrono::{TimeZone, Utc};

    fn citation(url: &str, domain: Option<&str>, text: &str) -> Citation {
        Citation {
            id: "cit-1".to_string(),
            url: url.to_string(),
            domain: domain.map(str::to_string),
            text: text.to_string(),
            source: "Example".to_string(),
            provider: Provider::GoogleAi,
            query: "best widgets, ranked".to_string(),
            query_id: "query-1".to_string(),
            is_brand_mention: true,
            is_domain_citation: domain == Some("acme.com"),
            produced_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_csv_has_header_and_quoted_fields() {
        let citations = vec![citation(
            "https://acme.com/a",
            Some("acme.com"),
            "Acme \"wins\" again, decisively",
        )];
        let csv = citations_to_csv(&citations).expect("export succeeds");

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Query,Platform,Source,Citation Text,URL,Domain,Brand Mention,Domain Citation,Timestamp"
        );
        let row = lines.next().unwrap();
        // Comma-bearing and quote-bearing fields come back quoted/escaped
        assert!(row.starts_with("\"best widgets, ranked\",Google AI Overview,"));
        assert!(row.contains("\"Acme \"\"wins\"\" again, decisively\""));
        assert!(row.contains(",Yes,Yes,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_missing_domain_exports_empty_field() {
        let citations = vec![citation("not a url", None, "text")];
        let csv = citations_to_csv(&citations).expect("export succeeds");
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("not a url,,Yes,No,"));
    }

    #[test]
    fn test_external_filter_drops_google_self_references() {
        let citations = vec![
            citation("https://acme.com/a", Some("acme.com"), "a"),
            citation("https://www.google.com/search", Some("google.com"), "b"),
            citation("not a url", None, "c"),
        ];
        let external = external_citations(&citations);
        assert_eq!(external.len(), 2);
        assert!(external.iter().all(|c| c.domain.as_deref() != Some("google.com")));
    }
}
