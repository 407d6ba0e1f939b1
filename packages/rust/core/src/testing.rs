//! In-process fakes for the collaborator traits, shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use tutorgraph_ontology::ConceptGraph;
use tutorgraph_retrieval::{LexicalIndex, RetrievalCoordinator, SimilarityIndex};
use tutorgraph_shared::{
    ConceptNode, DocumentMetadata, Evaluation, Evidence, Result, TutorError, VerificationSource,
    VerificationSourceType,
};

use crate::generation::{ChatResponse, GenerationBackend};
use crate::verification::{AnswerEvaluator, EvidenceSource};

/// Retrieval over an in-memory lexical index holding `texts`.
pub async fn coordinator_with(texts: &[&str]) -> Arc<RetrievalCoordinator> {
    let mut index = LexicalIndex::new(0.0);
    for text in texts {
        index
            .add_document(text.to_string(), DocumentMetadata::default())
            .await
            .expect("index document");
    }
    Arc::new(RetrievalCoordinator::new(index))
}

/// Small vocal-technique graph: vibrato needs breath support, which needs posture.
pub fn vocal_graph() -> ConceptGraph {
    let mut graph = ConceptGraph::new();
    graph.insert(ConceptNode {
        id: "vibrato".into(),
        label: "Vibrato".into(),
        prerequisites: vec!["breath_support".into()],
        related_concepts: vec!["resonance".into()],
        next_steps: vec!["Practice slow pitch oscillation".into()],
    });
    graph.insert(ConceptNode {
        id: "breath_support".into(),
        label: "Breath support".into(),
        prerequisites: vec!["posture".into()],
        related_concepts: vec!["vibrato".into()],
        next_steps: vec![],
    });
    graph.insert(ConceptNode {
        id: "posture".into(),
        label: "Posture".into(),
        ..Default::default()
    });
    graph.insert(ConceptNode {
        id: "resonance".into(),
        label: "Resonance".into(),
        ..Default::default()
    });
    graph
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Records every prompt and answers with a fixed reply or error.
pub struct RecordingBackend {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl GenerationBackend for RecordingBackend {
    async fn chat(&self, prompt: &str) -> Result<ChatResponse> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        match &self.reply {
            Ok(response) => Ok(ChatResponse {
                response: response.clone(),
            }),
            Err(message) => Err(TutorError::Generation(message.clone())),
        }
    }
}

/// Blocks inside `chat` until released, to hold a request in flight.
#[derive(Default)]
pub struct GatedBackend {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl GenerationBackend for GatedBackend {
    async fn chat(&self, _prompt: &str) -> Result<ChatResponse> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ChatResponse {
            response: "released".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

pub struct StaticEvidence {
    source_type: VerificationSourceType,
    evidence: Vec<Evidence>,
}

impl StaticEvidence {
    pub fn new(source_type: VerificationSourceType, evidence: Vec<Evidence>) -> Self {
        Self {
            source_type,
            evidence,
        }
    }
}

#[async_trait]
impl EvidenceSource for StaticEvidence {
    fn source_type(&self) -> VerificationSourceType {
        self.source_type
    }

    async fn gather(&self, _question: &str) -> Result<Vec<Evidence>> {
        Ok(self.evidence.clone())
    }
}

/// Evidence source that waits for `release` before answering.
pub struct GatedEvidence {
    source_type: VerificationSourceType,
    pub started: Notify,
    pub release: Notify,
}

impl GatedEvidence {
    pub fn new(source_type: VerificationSourceType) -> Self {
        Self {
            source_type,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl EvidenceSource for GatedEvidence {
    fn source_type(&self) -> VerificationSourceType {
        self.source_type
    }

    async fn gather(&self, _question: &str) -> Result<Vec<Evidence>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
}

/// Evidence source whose backend is always down.
pub struct FailingEvidence {
    source_type: VerificationSourceType,
}

impl FailingEvidence {
    pub fn new(source_type: VerificationSourceType) -> Self {
        Self { source_type }
    }
}

#[async_trait]
impl EvidenceSource for FailingEvidence {
    fn source_type(&self) -> VerificationSourceType {
        self.source_type
    }

    async fn gather(&self, _question: &str) -> Result<Vec<Evidence>> {
        Err(TutorError::evidence(self.source_type, "backend unreachable"))
    }
}

/// Encodes its inputs into the verdict so tests can see what it was given.
pub struct EchoEvaluator;

#[async_trait]
impl AnswerEvaluator for EchoEvaluator {
    async fn evaluate_with_sources(
        &self,
        _question: &str,
        answer: &str,
        source: &VerificationSource,
    ) -> Result<Evaluation> {
        Ok(Evaluation {
            label: source.source_type.to_string(),
            confidence: 0.42,
            rationale: format!("{answer} ({} items)", source.evidence.len()),
        })
    }
}

pub struct FailingEvaluator;

#[async_trait]
impl AnswerEvaluator for FailingEvaluator {
    async fn evaluate_with_sources(
        &self,
        _question: &str,
        _answer: &str,
        _source: &VerificationSource,
    ) -> Result<Evaluation> {
        Err(TutorError::Evaluation("evaluator unavailable".into()))
    }
}
