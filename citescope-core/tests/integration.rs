//! Integration tests for the citescope analytics pipeline
//!
//! These tests drive the full flow end-to-end: seed a brand, competitors,
//! and a multi-session query history in a temporary database, then verify
//! aggregation, caching, trend computation, and CSV export.

use chrono::{DateTime, Duration, TimeZone, Utc};
use citescope_core::analytics::{ensure_report, SnapshotScope, TrendDirection};
use citescope_core::analyzer::analyze_history;
use citescope_core::db::Database;
use citescope_core::export::citations_to_csv;
use citescope_core::types::{
    Brand, ChatGptPayload, Competitor, GoogleAiPayload, GoogleAiReference, PerplexityPayload,
    PerplexitySearchResult, ProcessingSession, Provider, ProviderPayload, ProviderResult,
    QueryRecord,
};
use tempfile::TempDir;

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap()
}

fn ok(payload: ProviderPayload, minute: u32) -> ProviderResult {
    ProviderResult {
        payload,
        success: true,
        error: None,
        response_time_ms: Some(850),
        retrieved_at: ts(minute),
    }
}

fn failed(payload: ProviderPayload, minute: u32) -> ProviderResult {
    ProviderResult {
        payload,
        success: false,
        error: Some("provider timeout".to_string()),
        response_time_ms: None,
        retrieved_at: ts(minute),
    }
}

fn chatgpt(content: &str) -> ProviderPayload {
    ProviderPayload::ChatGpt(ChatGptPayload {
        content: content.to_string(),
        ..Default::default()
    })
}

fn google(content: &str, references: Vec<GoogleAiReference>) -> ProviderPayload {
    ProviderPayload::GoogleAi(GoogleAiPayload {
        content: content.to_string(),
        references,
    })
}

fn perplexity(content: &str, search_results: Vec<PerplexitySearchResult>) -> ProviderPayload {
    ProviderPayload::Perplexity(PerplexityPayload {
        content: content.to_string(),
        citations: vec![],
        search_results,
    })
}

fn reference(link: &str, snippet: &str) -> GoogleAiReference {
    GoogleAiReference {
        link: link.to_string(),
        title: "Reference".to_string(),
        snippet: snippet.to_string(),
        source: "Publisher".to_string(),
    }
}

fn search_result(url: &str, snippet: &str) -> PerplexitySearchResult {
    PerplexitySearchResult {
        url: url.to_string(),
        title: "Result".to_string(),
        snippet: snippet.to_string(),
    }
}

struct Fixture {
    _dir: TempDir,
    db: Database,
    brand: Brand,
    competitors: Vec<Competitor>,
}

/// Seed two processing sessions of history:
///
/// - session-1 (6 queries, q1-q6): brand mentioned in 2 -> visibility 33
/// - session-2 (4 queries, q7-q10): brand mentioned in 2 -> visibility 50
///
/// Lifetime: brand mentioned in 4 of 10 queries -> visibility 40.
fn seed() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("test.db")).expect("database should open");
    db.migrate().expect("migrations should run");

    let brand = Brand {
        id: "brand-1".to_string(),
        name: "Acme".to_string(),
        domain: Some("acme.com".to_string()),
        aliases: vec![],
        created_at: ts(0),
        metadata: serde_json::json!({}),
    };
    db.upsert_brand(&brand).expect("brand insert");

    let competitors = vec![Competitor {
        id: "comp-1".to_string(),
        brand_id: brand.id.clone(),
        name: "Globex".to_string(),
        domain: Some("globex.io".to_string()),
        aliases: vec![],
        created_at: ts(0),
    }];
    db.insert_competitor(&competitors[0]).expect("competitor insert");

    for (session, minute) in [("session-1", 1), ("session-2", 30)] {
        db.insert_session(&ProcessingSession {
            id: session.to_string(),
            brand_id: brand.id.clone(),
            started_at: ts(minute),
            completed_at: None,
        })
        .expect("session insert");
    }

    let records: Vec<(&str, &str, u32, Vec<ProviderResult>)> = vec![
        // session-1: brand mentioned in q1 and q6
        ("q1", "session-1", 2, vec![ok(chatgpt("Acme makes solid widgets"), 2)]),
        (
            "q2",
            "session-1",
            3,
            vec![ok(
                perplexity(
                    "Globex dominates the mid market",
                    vec![search_result("https://globex.io/widgets", "Globex lineup")],
                ),
                3,
            )],
        ),
        ("q3", "session-1", 4, vec![ok(chatgpt("nothing notable here"), 4)]),
        (
            "q4",
            "session-1",
            5,
            vec![
                ok(google("a plain overview", vec![]), 5),
                failed(perplexity("", vec![]), 5),
            ],
        ),
        ("q5", "session-1", 6, vec![ok(chatgpt("still nothing notable"), 6)]),
        (
            "q6",
            "session-1",
            7,
            vec![ok(perplexity("Acme Corp is frequently cited", vec![]), 7)],
        ),
        // session-2: brand mentioned in q7 and q8
        ("q7", "session-2", 31, vec![ok(chatgpt("Acme leads the category"), 31)]),
        (
            "q8",
            "session-2",
            32,
            vec![ok(
                google(
                    "Acme tops the overview",
                    vec![
                        reference("https://www.acme.com/report", "Acme annual widget report"),
                        reference("https://example.org/roundup", "Independent roundup"),
                    ],
                ),
                32,
            )],
        ),
        (
            "q9",
            "session-2",
            33,
            vec![
                ok(chatgpt("no brands named"), 33),
                failed(google("Acme Acme Acme", vec![]), 33),
            ],
        ),
        // q10 carries a citation whose URL does not parse; it must still
        // count toward citation totals, just without a domain
        (
            "q10",
            "session-2",
            34,
            vec![ok(
                perplexity("quiet query", vec![search_result("not a url", "plain text")]),
                34,
            )],
        ),
    ];

    for (id, session, minute, results) in records {
        db.insert_query_record(&QueryRecord {
            id: id.to_string(),
            brand_id: brand.id.clone(),
            session_id: session.to_string(),
            query: format!("widget question {}", id),
            submitted_at: ts(minute),
            results,
            raw_data: serde_json::json!({}),
        })
        .expect("record insert");
    }

    Fixture {
        _dir: dir,
        db,
        brand,
        competitors,
    }
}

// ============================================
// Lifetime aggregation
// ============================================

#[test]
fn test_lifetime_visibility_counts_queries_with_mentions() {
    let f = seed();
    let report = ensure_report(
        &f.db,
        &f.brand,
        &f.competitors,
        SnapshotScope::Lifetime,
        Duration::zero(),
    )
    .expect("report");

    assert_eq!(report.brand.scope, SnapshotScope::Lifetime);
    assert_eq!(report.brand.total_queries_processed, 10);
    assert_eq!(report.brand.brand_visibility_score, 40);

    // The failed provider results contributed nothing
    assert_eq!(report.brand.provider(Provider::ChatGpt).queries_processed, 5);
    assert_eq!(report.brand.provider(Provider::GoogleAi).queries_processed, 2);
    assert_eq!(report.brand.provider(Provider::Perplexity).queries_processed, 3);

    // q8's acme.com reference is the only domain citation; q10's
    // unparsable-URL citation still counts toward the citation total
    assert_eq!(report.brand.total_domain_citations, 1);
    assert_eq!(report.brand.total_citations, 4);
}

#[test]
fn test_competitor_and_share_of_voice_rollup() {
    let f = seed();
    let report = ensure_report(
        &f.db,
        &f.brand,
        &f.competitors,
        SnapshotScope::Lifetime,
        Duration::zero(),
    )
    .expect("report");

    let globex = &report.competitors.competitors[0];
    assert_eq!(globex.name, "Globex");
    assert_eq!(globex.total_mentions, 1);
    assert_eq!(globex.top_provider, Some(Provider::Perplexity));
    assert_eq!(report.competitors.unique_competitors_detected, 1);
    assert_eq!(
        report.competitors.insights.top_competitor.as_deref(),
        Some("Globex")
    );

    // Brand 4 mentions vs Globex 1: brand ranks first
    assert_eq!(report.share_of_voice.total_market_mentions, 5);
    assert_eq!(report.share_of_voice.brand_rank, Some(1));
    assert_eq!(report.share_of_voice.brand_share_pct, 80);
    assert_eq!(report.share_of_voice.competitor_share_pct, 20);
}

// ============================================
// Latest scope and trend
// ============================================

#[test]
fn test_latest_scope_covers_only_newest_session() {
    let f = seed();
    let report = ensure_report(
        &f.db,
        &f.brand,
        &f.competitors,
        SnapshotScope::Latest,
        Duration::zero(),
    )
    .expect("report");

    assert_eq!(report.brand.total_queries_processed, 4);
    assert_eq!(report.brand.brand_visibility_score, 50);

    // Session 1 sat at 33% visibility; session 2 improved on it
    assert_eq!(report.brand.insights.mention_trend, Some(TrendDirection::Up));
}

// ============================================
// Cache behavior
// ============================================

#[test]
fn test_report_cached_and_invalidated_by_history_changes() {
    let f = seed();
    let ttl = Duration::minutes(30);

    let first = ensure_report(&f.db, &f.brand, &f.competitors, SnapshotScope::Lifetime, ttl)
        .expect("report");
    let second = ensure_report(&f.db, &f.brand, &f.competitors, SnapshotScope::Lifetime, ttl)
        .expect("cached report");
    assert_eq!(first, second);

    // Append one more mentioned query; with a zero TTL the digest check
    // runs and must invalidate the cached report.
    f.db.insert_query_record(&QueryRecord {
        id: "q11".to_string(),
        brand_id: f.brand.id.clone(),
        session_id: "session-2".to_string(),
        query: "late question".to_string(),
        submitted_at: ts(40),
        results: vec![ok(chatgpt("Acme again"), 40)],
        raw_data: serde_json::json!({}),
    })
    .expect("append");

    let third = ensure_report(
        &f.db,
        &f.brand,
        &f.competitors,
        SnapshotScope::Lifetime,
        Duration::zero(),
    )
    .expect("recomputed report");

    assert_eq!(third.brand.total_queries_processed, 11);
    // 5 of 11 queries mentioned -> 45%
    assert_eq!(third.brand.brand_visibility_score, 45);
    assert!(third.brand.total_brand_mentions > first.brand.total_brand_mentions);
}

// ============================================
// Export
// ============================================

#[test]
fn test_citation_export_roundtrip() {
    let f = seed();
    let history = f.db.list_query_records(&f.brand.id).expect("history");
    let analyses = analyze_history(&history, &f.brand, &f.competitors);

    let citations: Vec<_> = analyses
        .iter()
        .flat_map(|a| &a.providers)
        .flat_map(|p| p.brand.citations.iter().cloned())
        .collect();
    assert_eq!(citations.len(), 4);
    assert!(citations
        .iter()
        .any(|c| c.url == "not a url" && c.domain.is_none()));

    let csv = citations_to_csv(&citations).expect("export");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Query,Platform,"));
    assert!(csv.contains("Google AI Overview"));
    assert!(csv.contains("acme.com"));
    assert!(csv.contains("not a url"));
}
