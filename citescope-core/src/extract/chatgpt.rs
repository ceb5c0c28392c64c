//! ChatGPT Search citation extraction
//!
//! ChatGPT Search responses carry `url_citation` annotations with a URL,
//! title, and (usually) byte offsets into the answer text marking the cited
//! span. The cited span, when recoverable, becomes the citation's context
//! text; the title becomes the source label.

use super::CitationShaper;
use crate::types::{ChatGptPayload, Citation, Provider};

pub(super) fn extract(payload: &ChatGptPayload, shaper: &CitationShaper<'_>) -> Vec<Citation> {
    payload
        .annotations
        .iter()
        .map(|annotation| {
            let text = cited_span(&payload.content, annotation.start_index, annotation.end_index)
                .unwrap_or(&annotation.title);
            shaper.shape(Provider::ChatGpt, &annotation.url, text, &annotation.title)
        })
        .collect()
}

/// Slice the annotated span out of the answer text.
///
/// Returns `None` when offsets are missing, out of range, inverted, or not
/// on character boundaries; callers fall back to the annotation title.
fn cited_span(content: &str, start: Option<usize>, end: Option<usize>) -> Option<&str> {
    let (start, end) = (start?, end?);
    if start >= end {
        return None;
    }
    content.get(start..end)
}
