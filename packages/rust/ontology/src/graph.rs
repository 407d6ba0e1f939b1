//! In-memory concept graph.
//!
//! Built once from the ontology JSON and read-only afterwards. Traversals are
//! iterative breadth-first walks with a visited set, so cyclic
//! `prerequisites` / `relatedConcepts` edges terminate and every concept is
//! reported at most once.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use tutorgraph_shared::{ConceptId, ConceptNode, Result, TutorError};

/// Which outgoing edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Prerequisite,
    Related,
}

impl EdgeKind {
    fn targets(self, node: &ConceptNode) -> &[ConceptId] {
        match self {
            Self::Prerequisite => &node.prerequisites,
            Self::Related => &node.related_concepts,
        }
    }
}

/// Graph of learning concepts keyed by concept ID.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    nodes: HashMap<ConceptId, ConceptNode>,
    /// IDs in the order the ontology file lists them.
    order: Vec<ConceptId>,
}

/// Ontology entry as it appears on disk. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConcept {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "name")]
    label: Option<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default, alias = "related")]
    related_concepts: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

impl ConceptGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from parsed ontology JSON.
    ///
    /// Accepts `{ "concepts": { <id>: entry } }`, `{ "concepts": [ { "id": .. } ] }`,
    /// or a bare `{ <id>: entry }` map.
    #[instrument(skip_all)]
    pub fn load_ontology(data: &serde_json::Value) -> Result<Self> {
        let entries = match data.get("concepts") {
            Some(concepts @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => concepts,
            _ => data,
        };

        let mut graph = Self::new();
        match entries {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    let raw = parse_entry(key, value)?;
                    graph.insert(into_node(key.clone(), raw));
                }
            }
            serde_json::Value::Array(items) => {
                for (index, value) in items.iter().enumerate() {
                    let raw = parse_entry(&format!("#{index}"), value)?;
                    let id = raw.id.clone().ok_or_else(|| {
                        TutorError::parse(format!("ontology entry #{index} has no id"))
                    })?;
                    graph.insert(into_node(id, raw));
                }
            }
            _ => {
                return Err(TutorError::parse(
                    "ontology must be a JSON object keyed by concept id",
                ));
            }
        }

        info!(concepts = graph.len(), "ontology loaded");
        Ok(graph)
    }

    /// Add or replace a concept.
    pub fn insert(&mut self, node: ConceptNode) {
        if !self.nodes.contains_key(&node.id) {
            self.order.push(node.id.clone());
        }
        debug!(id = %node.id, "concept stored");
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a concept by ID.
    pub fn get_concept(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All concepts in load order.
    pub fn concepts(&self) -> impl Iterator<Item = &ConceptNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Transitive closure of the `prerequisites` edge, nearest first.
    ///
    /// Excludes `id` itself. Prerequisites missing from the graph are reported
    /// but not expanded. Unknown `id` yields an empty chain.
    pub fn prerequisite_chain(&self, id: &str) -> Vec<ConceptId> {
        self.walk(id, EdgeKind::Prerequisite, None)
    }

    /// Concepts reachable over `relatedConcepts` within `depth` hops, nearest first.
    ///
    /// `depth == 1` returns direct neighbours; `depth == 0` returns nothing.
    pub fn related_concepts(&self, id: &str, depth: usize) -> Vec<ConceptId> {
        self.walk(id, EdgeKind::Related, Some(depth))
    }

    /// Breadth-first walk from `start` over one edge kind.
    fn walk(&self, start: &str, edge: EdgeKind, max_depth: Option<usize>) -> Vec<ConceptId> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(start);

        let mut reached = Vec::new();
        let mut frontier: VecDeque<(&str, usize)> = VecDeque::new();
        frontier.push_back((start, 0));

        while let Some((current, depth)) = frontier.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for next in edge.targets(node) {
                if visited.insert(next.as_str()) {
                    reached.push(next.clone());
                    frontier.push_back((next.as_str(), depth + 1));
                }
            }
        }

        reached
    }
}

fn parse_entry(key: &str, value: &serde_json::Value) -> Result<RawConcept> {
    RawConcept::deserialize(value)
        .map_err(|e| TutorError::parse(format!("ontology entry '{key}': {e}")))
}

fn into_node(id: ConceptId, raw: RawConcept) -> ConceptNode {
    ConceptNode {
        label: raw.label.unwrap_or_else(|| id.clone()),
        prerequisites: dedup(raw.prerequisites),
        related_concepts: dedup(raw.related_concepts),
        next_steps: raw.next_steps,
        id,
    }
}

/// Drop repeated IDs, keeping the first occurrence.
fn dedup(ids: Vec<ConceptId>) -> Vec<ConceptId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
