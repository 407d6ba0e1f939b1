//! Core domain types shared by the retrieval, ontology, and orchestration crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Concept identifier as it appears in the ontology file.
pub type ConceptId = String;

/// One opaque evidence item returned by a verification source.
pub type Evidence = serde_json::Value;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one orchestrator session (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Documents and retrieval
// ---------------------------------------------------------------------------

/// Descriptive metadata attached to a corpus document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Difficulty level (e.g. `beginner`, `advanced`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Estimated reading time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_reading_time: Option<f64>,
    /// Any other keys the corpus carries, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A passage indexed for retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// A document paired with its relevance to a query.
///
/// Lists of results are sorted by `similarity` descending, ties in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub document: Document,
    /// Relevance in `[0, 1]`.
    pub similarity: f32,
}

// ---------------------------------------------------------------------------
// Concepts and adaptive support
// ---------------------------------------------------------------------------

/// Concepts mentioned by a question, in mention order. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExpansion {
    pub original_query: String,
    pub concepts: Vec<ConceptId>,
}

impl QueryExpansion {
    pub fn new(original_query: impl Into<String>, concepts: Vec<ConceptId>) -> Self {
        Self {
            original_query: original_query.into(),
            concepts,
        }
    }
}

/// A node of the concept graph.
///
/// `prerequisites` and `related_concepts` are duplicate-free and keep file order.
/// Edges may form cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: ConceptId,
    pub label: String,
    #[serde(default)]
    pub prerequisites: Vec<ConceptId>,
    #[serde(default)]
    pub related_concepts: Vec<ConceptId>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// One scaffolding category shown alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportCategory {
    pub message: String,
    pub items: Vec<String>,
}

/// Scaffolding derived from the concept graph.
///
/// A category is `Some` only when it has at least one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveSupport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<SupportCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_concepts: Option<SupportCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<SupportCategory>,
}

impl AdaptiveSupport {
    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_none() && self.related_concepts.is_none() && self.next_steps.is_none()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The independent evidence channels an answer can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationSourceType {
    Academic,
    Books,
    Web,
}

impl VerificationSourceType {
    pub const ALL: [Self; 3] = [Self::Academic, Self::Books, Self::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Books => "books",
            Self::Web => "web",
        }
    }
}

impl std::fmt::Display for VerificationSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationSourceType {
    type Err = crate::error::TutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "books" | "book" => Ok(Self::Books),
            "web" => Ok(Self::Web),
            other => Err(crate::error::TutorError::validation(format!(
                "unknown verification source '{other}' (expected academic, books, or web)"
            ))),
        }
    }
}

/// Evidence gathered from one verification source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSource {
    #[serde(rename = "type")]
    pub source_type: VerificationSourceType,
    pub evidence: Vec<Evidence>,
}

/// Verdict produced by the external evaluation capability. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub label: String,
    pub confidence: f64,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// The most recently answered question, kept for on-demand verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_parses_case_insensitively() {
        assert_eq!(
            "Academic".parse::<VerificationSourceType>().unwrap(),
            VerificationSourceType::Academic
        );
        assert_eq!(
            " web ".parse::<VerificationSourceType>().unwrap(),
            VerificationSourceType::Web
        );
        assert!("forum".parse::<VerificationSourceType>().is_err());
    }

    #[test]
    fn verification_source_uses_type_key() {
        let source = VerificationSource {
            source_type: VerificationSourceType::Books,
            evidence: vec![serde_json::json!({"title": "The Singer's Manual"})],
        };
        let json = serde_json::to_value(&source).expect("serialize");
        assert_eq!(json["type"], "books");
        assert_eq!(json["evidence"][0]["title"], "The Singer's Manual");
    }

    #[test]
    fn empty_support_categories_are_omitted() {
        let support = AdaptiveSupport {
            prerequisites: Some(SupportCategory {
                message: "Background".into(),
                items: vec!["breathing".into()],
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&support).expect("serialize");
        assert!(json.get("prerequisites").is_some());
        assert!(json.get("relatedConcepts").is_none());
        assert!(json.get("nextSteps").is_none());
        assert!(!support.is_empty());
        assert!(AdaptiveSupport::default().is_empty());
    }

    #[test]
    fn metadata_keeps_unknown_keys() {
        let json = r#"{"title":"Breath","estimatedReadingTime":5,"author":"K. Sato"}"#;
        let meta: DocumentMetadata = serde_json::from_str(json).expect("deserialize");
        assert_eq!(meta.title.as_deref(), Some("Breath"));
        assert_eq!(meta.estimated_reading_time, Some(5.0));
        assert_eq!(meta.extra["author"], "K. Sato");
    }

    #[test]
    fn query_expansion_wire_format() {
        let expansion = QueryExpansion::new("what is vibrato", vec!["vibrato".into()]);
        let json = serde_json::to_string(&expansion).expect("serialize");
        assert!(json.contains(r#""originalQuery":"what is vibrato""#));
    }
}
