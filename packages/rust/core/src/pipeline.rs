//! End-to-end question pipeline: question → concepts → retrieval → answer → support.
//!
//! [`Orchestrator`] is the per-session context. It owns the query lock, one
//! lock per verification source type, and the last answered exchange that
//! on-demand verification runs against.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

use tutorgraph_ontology::{ConceptGraph, expand_query};
use tutorgraph_retrieval::RetrievalCoordinator;
use tutorgraph_shared::{
    AdaptiveSupport, Exchange, QueryExpansion, RagOptions, Result, RetrievalResult, SessionId,
    SupportOptions, TutorError, VerificationSourceType,
};

use crate::generation::{GenerationBackend, GenerationCoordinator};
use crate::support::AdaptiveSupportEngine;
use crate::verification::{VerificationCoordinator, VerificationReport};

/// Everything produced for one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorResponse {
    pub question: String,
    pub answer: String,
    /// `None` when no passage was relevant and the answer is ungrounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<RetrievalResult>>,
    pub expanded_query: QueryExpansion,
    pub adaptive_support: AdaptiveSupport,
}

/// Progress callback for long-running pipeline phases.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once retrieval and generation have finished.
    fn answered(&self, grounded_on: usize);
    /// Called when the pipeline completes.
    fn done(&self, response: &TutorResponse);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn answered(&self, _grounded_on: usize) {}
    fn done(&self, _response: &TutorResponse) {}
}

pub struct Orchestrator {
    session_id: SessionId,
    graph: Arc<ConceptGraph>,
    generation: GenerationCoordinator,
    support: AdaptiveSupportEngine,
    verification: Option<VerificationCoordinator>,
    rag: RagOptions,
    query_lock: Mutex<()>,
    /// Indexed by [`lock_slot`].
    verify_locks: [Mutex<()>; 3],
    last_exchange: RwLock<Option<Exchange>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        retrieval: Arc<RetrievalCoordinator>,
        graph: Arc<ConceptGraph>,
        backend: Arc<dyn GenerationBackend>,
        rag: RagOptions,
        support: SupportOptions,
    ) -> Self {
        let session_id = SessionId::new();
        info!(
            %session_id,
            documents = retrieval.document_count(),
            concepts = graph.len(),
            "session created"
        );
        Self {
            session_id,
            generation: GenerationCoordinator::new(retrieval, backend),
            support: AdaptiveSupportEngine::new(Arc::clone(&graph), support),
            graph,
            verification: None,
            rag,
            query_lock: Mutex::new(()),
            verify_locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
            last_exchange: RwLock::new(None),
        }
    }

    /// Enable on-demand verification.
    pub fn with_verification(mut self, verification: VerificationCoordinator) -> Self {
        self.verification = Some(verification);
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Source types that can be verified in this session.
    pub fn available_verifications(&self) -> Vec<VerificationSourceType> {
        self.verification
            .as_ref()
            .map(VerificationCoordinator::available)
            .unwrap_or_default()
    }

    /// The most recently answered question, if any.
    pub async fn last_exchange(&self) -> Option<Exchange> {
        self.last_exchange.read().await.clone()
    }

    /// Answer `question` with the session's default options.
    pub async fn ask(&self, question: &str) -> Result<TutorResponse> {
        self.ask_with(question, &self.rag, &SilentProgress).await
    }

    /// Run the full question pipeline.
    ///
    /// 1. Expand the question into mentioned concepts
    /// 2. Retrieve passages and generate an answer
    /// 3. Build adaptive support from the concept graph
    /// 4. Remember the exchange for later verification
    ///
    /// Only one question runs at a time; a concurrent call fails with `Busy`.
    #[instrument(skip_all, fields(session = %self.session_id, retrieve_count = options.retrieve_count))]
    pub async fn ask_with(
        &self,
        question: &str,
        options: &RagOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<TutorResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }
        let _guard = self
            .query_lock
            .try_lock()
            .map_err(|_| TutorError::busy("question answering"))?;
        let start = Instant::now();

        // --- Phase 1: Concepts ---
        progress.phase("Identifying concepts");
        let expanded_query = expand_query(&self.graph, question);

        // --- Phase 2: Retrieval + generation ---
        progress.phase("Generating answer");
        let rag = self.generation.answer(question, options.retrieve_count).await?;
        progress.answered(rag.sources.as_ref().map_or(0, Vec::len));

        // --- Phase 3: Adaptive support ---
        progress.phase("Building learning support");
        let adaptive_support = self.support.generate(&expanded_query);

        *self.last_exchange.write().await = Some(Exchange {
            question: question.to_string(),
            answer: rag.response.clone(),
            answered_at: Utc::now(),
        });

        let response = TutorResponse {
            question: question.to_string(),
            answer: rag.response,
            sources: rag.sources,
            expanded_query,
            adaptive_support,
        };

        info!(
            concepts = response.expanded_query.concepts.len(),
            grounded = response.sources.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "question answered"
        );
        progress.done(&response);
        Ok(response)
    }

    /// Verify the last answer against one evidence source.
    ///
    /// Distinct source types may run concurrently; a second request for a
    /// type already in flight fails with `Busy`.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn verify(&self, source_type: VerificationSourceType) -> Result<VerificationReport> {
        let _guard = self.verify_locks[lock_slot(source_type)]
            .try_lock()
            .map_err(|_| TutorError::busy(format!("{source_type} verification")))?;

        let exchange = self
            .last_exchange()
            .await
            .ok_or(TutorError::NothingToVerify)?;
        let verification = self
            .verification
            .as_ref()
            .ok_or_else(|| TutorError::evidence(source_type, "verification is not configured"))?;

        verification
            .run(source_type, &exchange.question, &exchange.answer)
            .await
    }
}

fn lock_slot(source_type: VerificationSourceType) -> usize {
    match source_type {
        VerificationSourceType::Academic => 0,
        VerificationSourceType::Books => 1,
        VerificationSourceType::Web => 2,
    }
}
