//! Brand/competitor mention matching
//!
//! Case-insensitive substring matching of an entity's name, aliases, and
//! domain against provider-generated text. Patterns are escaped before
//! compilation so names containing regex metacharacters ("C++", "Q&A Inc.")
//! match literally.
//!
//! Name and alias hits are counted independently; an alias that overlaps the
//! name ("Acme" / "Acme Corp") double-counts those spans. This matches the
//! behavior the rest of the pipeline was calibrated against.

use crate::types::MatchTarget;
use regex::{Regex, RegexBuilder};

/// Compiled matcher for one entity.
///
/// Compile once per entity and reuse across a history scan; compiling inside
/// a per-query loop rebuilds the same patterns thousands of times.
#[derive(Debug)]
pub struct MentionMatcher {
    name: Option<Regex>,
    aliases: Vec<Regex>,
    domain: Option<Regex>,
}

impl MentionMatcher {
    /// Build a matcher for the given entity.
    pub fn new(target: &MatchTarget<'_>) -> Self {
        Self {
            name: compile_literal(target.name),
            aliases: target
                .aliases
                .iter()
                .filter_map(|alias| compile_literal(alias))
                .collect(),
            domain: target.domain.and_then(compile_literal),
        }
    }

    /// Whether the entity's name, any alias, or its domain appears in `text`.
    pub fn is_mentioned(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.name.as_ref().is_some_and(|re| re.is_match(text))
            || self.aliases.iter().any(|re| re.is_match(text))
            || self.domain.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Total occurrences of the name plus each alias in `text`.
    ///
    /// The domain is not counted here; domain matching is reserved for
    /// citation-level checks.
    pub fn count_mentions(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let name_hits = self
            .name
            .as_ref()
            .map_or(0, |re| re.find_iter(text).count());
        let alias_hits: usize = self
            .aliases
            .iter()
            .map(|re| re.find_iter(text).count())
            .sum();
        name_hits + alias_hits
    }
}

/// Whether `entity` is mentioned in `text`. Empty text or name never match.
pub fn is_mentioned(text: &str, target: &MatchTarget<'_>) -> bool {
    MentionMatcher::new(target).is_mentioned(text)
}

/// Count of name + alias occurrences of `entity` in `text`.
pub fn count_mentions(text: &str, target: &MatchTarget<'_>) -> usize {
    MentionMatcher::new(target).count_mentions(text)
}

/// Compile a case-insensitive literal pattern; empty patterns never match.
fn compile_literal(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Failed to compile mention pattern");
            None
        }
    }
}
