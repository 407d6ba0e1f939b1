//! Generation prompt template.

/// Instruction line at the top of every grounded prompt.
const INSTRUCTION: &str = "Answer the question using the reference passages below.";

/// Combine a question with its assembled context into the generation prompt.
///
/// Fixed template, no hidden state: identical inputs give byte-identical output.
/// Only called with a non-empty context; questions without passages go to the
/// generator verbatim.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!("{INSTRUCTION}\n\nReference passages:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}
