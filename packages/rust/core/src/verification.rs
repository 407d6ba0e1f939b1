//! Multi-source fact verification.
//!
//! Evidence gathering and evaluation are both external capabilities. The
//! coordinator dispatches to the source registered for a type, hands the
//! evidence to the evaluator, and returns its verdict untouched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use tutorgraph_shared::{
    Evaluation, Evidence, Result, TutorError, VerificationSource, VerificationSourceType,
};

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// One evidence channel (academic papers, books, the web).
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn source_type(&self) -> VerificationSourceType;

    /// Collect evidence relevant to `question`.
    async fn gather(&self, question: &str) -> Result<Vec<Evidence>>;
}

/// Judges an answer against gathered evidence. Its scoring is opaque to us.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate_with_sources(
        &self,
        question: &str,
        answer: &str,
        source: &VerificationSource,
    ) -> Result<Evaluation>;
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Progress of a single verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Idle,
    Dispatched,
    EvidenceGathered,
    Evaluated,
    Failed,
}

impl VerificationState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use VerificationState::*;
        matches!(
            (self, next),
            (Idle, Dispatched)
                | (Dispatched, EvidenceGathered)
                | (Dispatched, Failed)
                | (EvidenceGathered, Evaluated)
                | (EvidenceGathered, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Evaluated | Self::Failed)
    }
}

/// Tracks one request through [`VerificationState`].
#[derive(Debug, Clone)]
pub struct VerificationRun {
    source_type: VerificationSourceType,
    state: VerificationState,
}

impl VerificationRun {
    pub fn new(source_type: VerificationSourceType) -> Self {
        Self {
            source_type,
            state: VerificationState::Idle,
        }
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&mut self, next: VerificationState) -> Result<()> {
        if self.state.is_terminal() {
            return Err(TutorError::evidence(
                self.source_type,
                format!("run already finished in state {:?}", self.state),
            ));
        }
        if !self.state.can_transition_to(next) {
            return Err(TutorError::evidence(
                self.source_type,
                format!("illegal state transition {:?} -> {next:?}", self.state),
            ));
        }
        debug!(source = %self.source_type, from = ?self.state, to = ?next, "verification state");
        self.state = next;
        Ok(())
    }

    /// Record a failure and hand the error back for propagation.
    fn fail(&mut self, err: TutorError) -> TutorError {
        if self.state.can_transition_to(VerificationState::Failed) {
            self.state = VerificationState::Failed;
        }
        warn!(source = %self.source_type, error = %err, "verification failed");
        err
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Evidence from one source and the evaluator's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub source: VerificationSource,
    pub evaluation: Evaluation,
}

pub struct VerificationCoordinator {
    sources: HashMap<VerificationSourceType, Arc<dyn EvidenceSource>>,
    evaluator: Arc<dyn AnswerEvaluator>,
}

impl VerificationCoordinator {
    pub fn new(evaluator: Arc<dyn AnswerEvaluator>) -> Self {
        Self {
            sources: HashMap::new(),
            evaluator,
        }
    }

    /// Register `source` for its type, replacing any previous one.
    pub fn with_source(mut self, source: Arc<dyn EvidenceSource>) -> Self {
        self.sources.insert(source.source_type(), source);
        self
    }

    /// Source types with a registered backend, in canonical order.
    pub fn available(&self) -> Vec<VerificationSourceType> {
        VerificationSourceType::ALL
            .into_iter()
            .filter(|t| self.sources.contains_key(t))
            .collect()
    }

    /// Gather evidence for `question` from the source registered for `source_type`.
    #[instrument(skip(self, question))]
    pub async fn verify(
        &self,
        source_type: VerificationSourceType,
        question: &str,
    ) -> Result<VerificationSource> {
        let source = self.sources.get(&source_type).ok_or_else(|| {
            TutorError::evidence(source_type, "no evidence source is configured")
        })?;

        let evidence = source.gather(question).await?;
        debug!(items = evidence.len(), "evidence gathered");
        Ok(VerificationSource {
            source_type,
            evidence,
        })
    }

    /// Ask the evaluator for a verdict. The result is returned as-is.
    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        source: &VerificationSource,
    ) -> Result<Evaluation> {
        self.evaluator.evaluate_with_sources(question, answer, source).await
    }

    /// Gather evidence, then evaluate `answer` against it.
    ///
    /// Either step failing ends the run with that error; no partial verdict
    /// is produced.
    #[instrument(skip(self, question, answer))]
    pub async fn run(
        &self,
        source_type: VerificationSourceType,
        question: &str,
        answer: &str,
    ) -> Result<VerificationReport> {
        let mut run = VerificationRun::new(source_type);
        run.advance(VerificationState::Dispatched)?;

        let source = match self.verify(source_type, question).await {
            Ok(source) => source,
            Err(err) => return Err(run.fail(err)),
        };
        run.advance(VerificationState::EvidenceGathered)?;

        let evaluation = match self.evaluate(question, answer, &source).await {
            Ok(evaluation) => evaluation,
            Err(err) => return Err(run.fail(err)),
        };
        run.advance(VerificationState::Evaluated)?;

        info!(label = %evaluation.label, confidence = evaluation.confidence, "answer evaluated");
        Ok(VerificationReport { source, evaluation })
    }
}
