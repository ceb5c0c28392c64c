//! Google AI Overview citation extraction
//!
//! The SERP payload lists the references an AI Overview cites: link, title,
//! snippet, and a publisher label. Snippets become citation text; the
//! publisher label (falling back to the title) becomes the source.
//!
//! References pointing at `google.com` itself are emitted like any other
//! citation; excluding the engine's self-references is done at the
//! presentation layer, not here.

use super::CitationShaper;
use crate::types::{Citation, GoogleAiPayload, Provider};

pub(super) fn extract(payload: &GoogleAiPayload, shaper: &CitationShaper<'_>) -> Vec<Citation> {
    payload
        .references
        .iter()
        .map(|reference| {
            let source = if reference.source.is_empty() {
                &reference.title
            } else {
                &reference.source
            };
            shaper.shape(Provider::GoogleAi, &reference.link, &reference.snippet, source)
        })
        .collect()
}
