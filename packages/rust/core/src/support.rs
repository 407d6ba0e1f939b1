//! Adaptive learning support derived from the concept graph.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use tutorgraph_ontology::ConceptGraph;
use tutorgraph_shared::{AdaptiveSupport, QueryExpansion, SupportCategory, SupportOptions};

pub const PREREQUISITES_MESSAGE: &str =
    "To understand this topic, it helps to know the following first:";
pub const RELATED_MESSAGE: &str = "Related topics:";
pub const NEXT_STEPS_MESSAGE: &str = "Good things to learn next:";

/// Builds prerequisite, related-topic, and next-step scaffolding for the
/// concepts a question mentions.
pub struct AdaptiveSupportEngine {
    graph: Arc<ConceptGraph>,
    options: SupportOptions,
}

impl AdaptiveSupportEngine {
    pub fn new(graph: Arc<ConceptGraph>, options: SupportOptions) -> Self {
        Self { graph, options }
    }

    /// Scaffolding for every concept in `expansion`, in mention order.
    ///
    /// Each category is deduplicated (first occurrence wins) and left out
    /// entirely when empty. Unknown concepts contribute nothing.
    pub fn generate(&self, expansion: &QueryExpansion) -> AdaptiveSupport {
        let mut prerequisites = Vec::new();
        let mut related = Vec::new();
        let mut next_steps = Vec::new();

        for concept in &expansion.concepts {
            prerequisites.extend(self.graph.prerequisite_chain(concept));
            related.extend(self.graph.related_concepts(concept, self.options.related_depth));
            if let Some(node) = self.graph.get_concept(concept) {
                next_steps.extend(node.next_steps.iter().cloned());
            }
        }

        let support = AdaptiveSupport {
            prerequisites: category(PREREQUISITES_MESSAGE, prerequisites),
            related_concepts: category(RELATED_MESSAGE, related),
            next_steps: category(NEXT_STEPS_MESSAGE, next_steps),
        };
        debug!(
            concepts = expansion.concepts.len(),
            empty = support.is_empty(),
            "adaptive support generated"
        );
        support
    }
}

fn category(message: &str, items: Vec<String>) -> Option<SupportCategory> {
    let mut seen = HashSet::new();
    let items: Vec<String> = items.into_iter().filter(|item| seen.insert(item.clone())).collect();
    if items.is_empty() {
        return None;
    }
    Some(SupportCategory {
        message: message.to_string(),
        items,
    })
}
