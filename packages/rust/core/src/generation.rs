//! Retrieval-augmented generation.
//!
//! Retrieves passages for a question, wraps them in the prompt template, and
//! calls the generation backend. With no passages the question goes to the
//! backend verbatim, so the generator never sees an empty reference section.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use tutorgraph_retrieval::RetrievalCoordinator;
use tutorgraph_shared::{Result, RetrievalResult};

use crate::assembler::build_context;
use crate::prompt::build_prompt;

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// Reply from the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// A text-generation capability (usually an LLM behind HTTP).
///
/// Failures should carry the upstream message; the pipeline surfaces it unchanged.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<ChatResponse>;
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Generated answer plus the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub response: String,
    /// `None` when retrieval found nothing and the fallback path was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<RetrievalResult>>,
}

pub struct GenerationCoordinator {
    retrieval: Arc<RetrievalCoordinator>,
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationCoordinator {
    pub fn new(retrieval: Arc<RetrievalCoordinator>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { retrieval, backend }
    }

    /// Answer `question` from the top `retrieve_count` passages.
    ///
    /// Backend failures propagate as-is: no retry, no partial answer.
    #[instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, retrieve_count: usize) -> Result<RagAnswer> {
        let results = self.retrieval.search(question, retrieve_count).await?;

        if results.is_empty() {
            info!("no relevant passages, asking the generator directly");
            let reply = self.backend.chat(question).await?;
            return Ok(RagAnswer {
                response: reply.response,
                sources: None,
            });
        }

        let context = build_context(&results);
        let prompt = build_prompt(question, &context);
        debug!(passages = results.len(), prompt_len = prompt.len(), "prompt built");

        let reply = self.backend.chat(&prompt).await?;
        info!(passages = results.len(), "answer generated");

        Ok(RagAnswer {
            response: reply.response,
            sources: Some(results),
        })
    }
}
