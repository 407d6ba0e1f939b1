//! Startup: load the corpus and the ontology, then build the index and graph.
//!
//! Both files are read concurrently; nothing is built until both reads have
//! finished, so no component ever sees a half-loaded knowledge base.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use tutorgraph_ontology::ConceptGraph;
use tutorgraph_retrieval::{LexicalIndex, RetrievalCoordinator, SimilarityIndex, parse_corpus};
use tutorgraph_shared::{
    AppConfig, DataConfig, RagOptions, Result, SupportOptions, TutorError,
};

use crate::generation::GenerationBackend;
use crate::pipeline::Orchestrator;

/// The immutable knowledge base a session answers from.
#[derive(Clone)]
pub struct Knowledge {
    pub retrieval: Arc<RetrievalCoordinator>,
    pub graph: Arc<ConceptGraph>,
}

impl std::fmt::Debug for Knowledge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Knowledge")
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

impl Knowledge {
    /// Build a session over this knowledge base.
    pub fn into_orchestrator(
        self,
        backend: Arc<dyn GenerationBackend>,
        config: &AppConfig,
    ) -> Orchestrator {
        Orchestrator::new(
            self.retrieval,
            self.graph,
            backend,
            RagOptions::from(config),
            SupportOptions::from(config),
        )
    }
}

/// Read the configured corpus and ontology files and build the knowledge base.
#[instrument(skip_all, fields(corpus = %data.corpus_path.display(), ontology = %data.ontology_path.display()))]
pub async fn load_knowledge(data: &DataConfig, min_similarity: f32) -> Result<Knowledge> {
    let start = Instant::now();

    let (corpus, ontology) = tokio::join!(
        read_file(&data.corpus_path),
        read_file(&data.ontology_path)
    );
    let (corpus, ontology) = (corpus?, ontology?);

    let knowledge = build_knowledge(&corpus, &ontology, min_similarity).await?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "knowledge base ready");
    Ok(knowledge)
}

/// Build the knowledge base from already-read corpus and ontology JSON.
pub async fn build_knowledge(
    corpus_json: &str,
    ontology_json: &str,
    min_similarity: f32,
) -> Result<Knowledge> {
    let entries = parse_corpus(corpus_json)?;
    let mut index = LexicalIndex::new(min_similarity);
    for entry in entries {
        let (text, metadata) = entry.into_parts();
        index.add_document(text, metadata).await?;
    }

    let ontology: serde_json::Value = serde_json::from_str(ontology_json)
        .map_err(|e| TutorError::parse(format!("invalid ontology file: {e}")))?;
    let graph = ConceptGraph::load_ontology(&ontology)?;

    info!(documents = index.len(), concepts = graph.len(), "knowledge base built");
    Ok(Knowledge {
        retrieval: Arc::new(RetrievalCoordinator::new(index)),
        graph: Arc::new(graph),
    })
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TutorError::io(path, e))
}
