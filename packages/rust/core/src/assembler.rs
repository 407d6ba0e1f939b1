//! Context assembler.
//!
//! Takes ranked retrieval results and writes them into the numbered
//! passage block that the prompt template embeds.

use tutorgraph_shared::RetrievalResult;

/// Separator between passages (one blank line).
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Render results as `[Passage i] <text>` blocks in rank order, `i` starting at 1.
///
/// Pure: the same results in the same order always give the same string.
/// An empty slice gives an empty string.
pub fn build_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| format!("[Passage {}] {}", index + 1, result.document.text))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorgraph_shared::{Document, DocumentMetadata};

    fn result(text: &str, similarity: f32) -> RetrievalResult {
        RetrievalResult {
            document: Document {
                id: "doc".into(),
                text: text.into(),
                metadata: DocumentMetadata::default(),
            },
            similarity,
        }
    }

    #[test]
    fn single_passage() {
        let context = build_context(&[result("Breath support is foundational.", 0.7)]);
        assert_eq!(context, "[Passage 1] Breath support is foundational.");
    }

    #[test]
    fn passages_are_numbered_in_rank_order() {
        let results = vec![result("First.", 0.9), result("Second.", 0.4), result("Third.", 0.1)];
        assert_eq!(
            build_context(&results),
            "[Passage 1] First.\n\n[Passage 2] Second.\n\n[Passage 3] Third."
        );
    }

    #[test]
    fn output_is_deterministic() {
        let results = vec![result("Posture.", 0.5), result("Resonance.", 0.5)];
        assert_eq!(build_context(&results), build_context(&results));
        assert!(build_context(&[]).is_empty());
    }
}
