//! Query expansion: which graph concepts does a question mention?

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use tutorgraph_shared::{ConceptId, QueryExpansion};

use crate::graph::ConceptGraph;

/// Shortest name that may count as a mention.
const MIN_MENTION_CHARS: usize = 2;

/// Find the concepts a question mentions, ordered by where they first appear.
///
/// A concept is mentioned when its ID or label occurs in the question,
/// case-insensitively and on word boundaries. `_` and `-` in IDs also match
/// spaces, so `breath_support` matches "breath support". Names written in
/// CJK scripts, which have no word separators, match anywhere.
pub fn expand_query(graph: &ConceptGraph, question: &str) -> QueryExpansion {
    let haystack = question.to_lowercase();

    let mut mentions: Vec<(usize, &ConceptId)> = graph
        .concepts()
        .filter_map(|concept| {
            mention_forms(&concept.id, &concept.label)
                .iter()
                .filter_map(|form| find_mention(&haystack, form))
                .min()
                .map(|pos| (pos, &concept.id))
        })
        .collect();
    mentions.sort();

    let concepts: Vec<ConceptId> = mentions.into_iter().map(|(_, id)| id.clone()).collect();
    debug!(?concepts, "query expanded");

    QueryExpansion::new(question, concepts)
}

/// Byte offset of the first mention of `form` in `haystack`.
fn find_mention(haystack: &str, form: &str) -> Option<usize> {
    static CJK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]").expect("valid regex")
    });

    if CJK_RE.is_match(form) {
        return haystack.find(form);
    }
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(form))).ok()?;
    pattern.find(haystack).map(|m| m.start())
}

fn mention_forms(id: &str, label: &str) -> Vec<String> {
    let id = id.to_lowercase();
    let spaced = id.replace(['_', '-'], " ");
    let mut forms = vec![id, spaced, label.to_lowercase()];
    forms.retain(|f| f.trim().chars().count() >= MIN_MENTION_CHARS);
    forms.dedup();
    forms
}
