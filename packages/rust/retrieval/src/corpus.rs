//! Corpus file parsing.
//!
//! Expected shape: `{ "documents": [ { "content" | "text": "...", "metadata": { ... } } ] }`.
//! When an entry has no `metadata` object, its top-level descriptive keys
//! (`title`, `subject`, `level`, `estimatedReadingTime`, ...) are used instead.

use serde::Deserialize;
use tracing::warn;

use tutorgraph_shared::{DocumentMetadata, Result, TutorError};

/// Root of a corpus file.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusFile {
    pub documents: Vec<CorpusEntry>,
}

/// One document as it appears in the corpus file.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusEntry {
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<DocumentMetadata>,
    /// Remaining top-level keys, used when `metadata` is absent.
    #[serde(flatten)]
    pub inline: DocumentMetadata,
}

impl CorpusEntry {
    /// Split into the `(text, metadata)` pair handed to the index.
    pub fn into_parts(self) -> (String, DocumentMetadata) {
        let metadata = self.metadata.unwrap_or(self.inline);
        (self.content, metadata)
    }
}

/// Parse corpus JSON, dropping entries whose text is blank.
pub fn parse_corpus(json: &str) -> Result<Vec<CorpusEntry>> {
    let file: CorpusFile = serde_json::from_str(json)
        .map_err(|e| TutorError::parse(format!("invalid corpus file: {e}")))?;

    let total = file.documents.len();
    let entries: Vec<CorpusEntry> = file
        .documents
        .into_iter()
        .filter(|entry| !entry.content.trim().is_empty())
        .collect();

    if entries.len() != total {
        warn!(skipped = total - entries.len(), "corpus entries with empty text skipped");
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_and_text_keys_are_both_accepted() {
        let json = r#"{"documents":[
            {"content":"Breath support is foundational.","metadata":{"title":"Breath","level":"beginner"}},
            {"text":"Vibrato is a pitch oscillation.","title":"Vibrato","estimatedReadingTime":3}
        ]}"#;
        let entries = parse_corpus(json).expect("parse");
        assert_eq!(entries.len(), 2);

        let (text, meta) = entries[0].clone().into_parts();
        assert_eq!(text, "Breath support is foundational.");
        assert_eq!(meta.title.as_deref(), Some("Breath"));
        assert_eq!(meta.level.as_deref(), Some("beginner"));

        let (_, meta) = entries[1].clone().into_parts();
        assert_eq!(meta.title.as_deref(), Some("Vibrato"));
        assert_eq!(meta.estimated_reading_time, Some(3.0));
    }

    #[test]
    fn blank_entries_are_skipped() {
        let json = r#"{"documents":[{"content":"   "},{"content":"Posture matters."}]}"#;
        let entries = parse_corpus(json).expect("parse");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_documents_key_is_a_parse_error() {
        let err = parse_corpus(r#"{"docs":[]}"#).unwrap_err();
        assert!(err.to_string().contains("invalid corpus file"));
    }

    #[test]
    fn corpus_fixture_parses() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/corpus.fixture.json")
            .expect("read fixture");
        let entries = parse_corpus(&fixture).expect("parse fixture");
        assert!(entries.len() >= 4);
        assert!(entries.iter().all(|e| !e.content.is_empty()));
    }
}
