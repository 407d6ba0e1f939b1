//! Plain-text and JSON output.

use color_eyre::eyre::Result;
use serde::Serialize;

use tutorgraph_core::pipeline::TutorResponse;
use tutorgraph_core::verification::VerificationReport;
use tutorgraph_shared::{RetrievalResult, SupportCategory, VerificationSourceType};

/// Result of verifying against one source, success or not.
#[derive(Debug, Serialize)]
pub(crate) struct VerificationOutcome {
    #[serde(rename = "type")]
    pub source_type: VerificationSourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<VerificationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationOutcome {
    pub fn new(
        source_type: VerificationSourceType,
        result: std::result::Result<VerificationReport, String>,
    ) -> Self {
        let (report, error) = match result {
            Ok(report) => (Some(report), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            source_type,
            report,
            error,
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    response: &'a TutorResponse,
    #[serde(skip_serializing_if = "no_outcomes")]
    verifications: &'a [VerificationOutcome],
}

fn no_outcomes(outcomes: &&[VerificationOutcome]) -> bool {
    outcomes.is_empty()
}

pub(crate) fn to_json(response: &TutorResponse, outcomes: &[VerificationOutcome]) -> Result<String> {
    let output = JsonOutput {
        response,
        verifications: outcomes,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

pub(crate) fn print_response(response: &TutorResponse) {
    print!("{}", format_response(response));
}

pub(crate) fn print_verification(outcome: &VerificationOutcome) {
    print!("{}", format_verification(outcome));
}

fn format_response(response: &TutorResponse) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(response.answer.trim());
    out.push_str("\n\n");

    match &response.sources {
        Some(sources) => {
            out.push_str("Sources:\n");
            for (i, source) in sources.iter().enumerate() {
                out.push_str(&format!("  [{}] {}\n", i + 1, source_label(source)));
                out.push_str(&format_source_details(source));
            }
        }
        None => out.push_str("Sources: none (no relevant passage in the corpus)\n"),
    }

    let support = &response.adaptive_support;
    for category in [
        &support.prerequisites,
        &support.related_concepts,
        &support.next_steps,
    ]
    .into_iter()
    .flatten()
    {
        out.push('\n');
        out.push_str(&format_category(category));
    }
    out.push('\n');
    out
}

/// Characters of passage text shown under each source.
const PREVIEW_CHARS: usize = 150;

fn source_label(source: &RetrievalResult) -> String {
    let name = source
        .document
        .metadata
        .title
        .as_deref()
        .unwrap_or(&source.document.id);
    format!(
        "{name} (similarity {:.2}, {} relevance)",
        source.similarity,
        relevance_tier(source.similarity)
    )
}

fn relevance_tier(similarity: f32) -> &'static str {
    if similarity > 0.8 {
        "high"
    } else if similarity > 0.5 {
        "medium"
    } else {
        "low"
    }
}

/// Metadata line (when any is present) and a short preview of the passage.
fn format_source_details(source: &RetrievalResult) -> String {
    let metadata = &source.document.metadata;
    let mut facts = Vec::new();
    if let Some(subject) = &metadata.subject {
        facts.push(format!("subject: {subject}"));
    }
    if let Some(level) = &metadata.level {
        facts.push(format!("level: {level}"));
    }
    if let Some(minutes) = metadata.estimated_reading_time {
        facts.push(format!("~{minutes} min read"));
    }

    let mut out = String::new();
    if !facts.is_empty() {
        out.push_str(&format!("      {}\n", facts.join(" | ")));
    }
    out.push_str(&format!("      \"{}\"\n", preview(&source.document.text)));
    out
}

fn preview(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn format_category(category: &SupportCategory) -> String {
    let mut out = format!("{}\n", category.message);
    for item in &category.items {
        out.push_str(&format!("  - {item}\n"));
    }
    out
}

fn format_verification(outcome: &VerificationOutcome) -> String {
    match (&outcome.report, &outcome.error) {
        (Some(report), _) => {
            let evaluation = &report.evaluation;
            format!(
                "Verification ({}): {} (confidence {:.2}, {} evidence items)\n  {}\n",
                outcome.source_type,
                evaluation.label,
                evaluation.confidence,
                report.source.evidence.len(),
                evaluation.rationale
            )
        }
        (None, Some(error)) => format!("Verification ({}) failed: {error}\n", outcome.source_type),
        (None, None) => format!("Verification ({}): no result\n", outcome.source_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorgraph_shared::{
        AdaptiveSupport, Document, DocumentMetadata, Evaluation, QueryExpansion, VerificationSource,
    };

    fn response(sources: Option<Vec<RetrievalResult>>) -> TutorResponse {
        TutorResponse {
            question: "What is vibrato?".into(),
            answer: "A regular oscillation of pitch.".into(),
            sources,
            expanded_query: QueryExpansion::new("What is vibrato?", vec!["vibrato".into()]),
            adaptive_support: AdaptiveSupport {
                prerequisites: Some(SupportCategory {
                    message: "Learn first:".into(),
                    items: vec!["breath_support".into()],
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn text_output_lists_sources_and_support() {
        let source = RetrievalResult {
            document: Document {
                id: "doc-2".into(),
                text: "Vibrato is...".into(),
                metadata: DocumentMetadata {
                    title: Some("Vibrato basics".into()),
                    subject: Some("vocal technique".into()),
                    level: Some("beginner".into()),
                    estimated_reading_time: Some(5.0),
                    ..Default::default()
                },
            },
            similarity: 0.5,
        };
        let text = format_response(&response(Some(vec![source])));
        assert!(text.contains("A regular oscillation of pitch."));
        assert!(text.contains("  [1] Vibrato basics (similarity 0.50, low relevance)"));
        assert!(text.contains("      subject: vocal technique | level: beginner | ~5 min read\n"));
        assert!(text.contains("      \"Vibrato is...\"\n"));
        assert!(text.contains("Learn first:\n  - breath_support"));
    }

    #[test]
    fn relevance_tiers_and_preview() {
        assert_eq!(relevance_tier(0.81), "high");
        assert_eq!(relevance_tier(0.8), "medium");
        assert_eq!(relevance_tier(0.51), "medium");
        assert_eq!(relevance_tier(0.5), "low");

        let long = "la ".repeat(100);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 3);
        assert_eq!(preview("Short   passage.\n"), "Short passage.");
    }

    #[test]
    fn ungrounded_answer_says_so() {
        let text = format_response(&response(None));
        assert!(text.contains("Sources: none"));
    }

    #[test]
    fn json_output_flattens_response() {
        let outcome = VerificationOutcome::new(
            VerificationSourceType::Web,
            Ok(VerificationReport {
                source: VerificationSource {
                    source_type: VerificationSourceType::Web,
                    evidence: vec![],
                },
                evaluation: Evaluation {
                    label: "supported".into(),
                    confidence: 0.9,
                    rationale: "ok".into(),
                },
            }),
        );
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&response(None), &[outcome]).unwrap()).unwrap();
        assert_eq!(json["answer"], "A regular oscillation of pitch.");
        assert_eq!(json["expandedQuery"]["concepts"][0], "vibrato");
        assert!(json.get("sources").is_none());
        assert_eq!(json["verifications"][0]["type"], "web");
        assert_eq!(json["verifications"][0]["report"]["evaluation"]["label"], "supported");
    }

    #[test]
    fn failed_verification_is_reported() {
        let outcome = VerificationOutcome::new(
            VerificationSourceType::Books,
            Err("books verification failed: no evidence source is configured".into()),
        );
        assert_eq!(
            format_verification(&outcome),
            "Verification (books) failed: books verification failed: no evidence source is configured\n"
        );
    }
}
