//! HTTP evidence sources and evaluator.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use tutorgraph_core::verification::{AnswerEvaluator, EvidenceSource, VerificationCoordinator};
use tutorgraph_shared::{
    Evaluation, Evidence, Result, TutorError, VerificationConfig, VerificationSource,
    VerificationSourceType,
};

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EvidenceRequest<'a> {
    question: &'a str,
    #[serde(rename = "type")]
    source_type: VerificationSourceType,
}

/// Backends reply with either a bare array or `{ "evidence": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EvidenceReply {
    List(Vec<Evidence>),
    Wrapped { evidence: Vec<Evidence> },
}

impl EvidenceReply {
    fn into_items(self) -> Vec<Evidence> {
        match self {
            Self::List(items) | Self::Wrapped { evidence: items } => items,
        }
    }
}

/// Evidence backend reached over HTTP, one per source type.
pub struct HttpEvidenceSource {
    client: Client,
    endpoint: Url,
    source_type: VerificationSourceType,
}

impl HttpEvidenceSource {
    pub fn new(source_type: VerificationSourceType, endpoint: Url, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(timeout_secs)?,
            endpoint,
            source_type,
        })
    }
}

#[async_trait]
impl EvidenceSource for HttpEvidenceSource {
    fn source_type(&self) -> VerificationSourceType {
        self.source_type
    }

    #[instrument(skip_all, fields(source = %self.source_type, endpoint = %self.endpoint))]
    async fn gather(&self, question: &str) -> Result<Vec<Evidence>> {
        let fail = |message: String| TutorError::evidence(self.source_type, message);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EvidenceRequest {
                question,
                source_type: self.source_type,
            })
            .send()
            .await
            .map_err(|e| fail(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(format!("service returned {status}: {}", body.trim())));
        }

        let reply: EvidenceReply = response
            .json()
            .await
            .map_err(|e| fail(format!("invalid evidence response: {e}")))?;
        let items = reply.into_items();
        debug!(items = items.len(), "evidence received");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EvaluationRequest<'a> {
    question: &'a str,
    answer: &'a str,
    source: &'a VerificationSource,
}

/// Remote evaluation service. Its verdict is returned exactly as received.
pub struct HttpEvaluator {
    client: Client,
    endpoint: Url,
}

impl HttpEvaluator {
    pub fn new(endpoint: Url, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(timeout_secs)?,
            endpoint,
        })
    }
}

#[async_trait]
impl AnswerEvaluator for HttpEvaluator {
    #[instrument(skip_all, fields(source = %source.source_type, evidence = source.evidence.len()))]
    async fn evaluate_with_sources(
        &self,
        question: &str,
        answer: &str,
        source: &VerificationSource,
    ) -> Result<Evaluation> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EvaluationRequest {
                question,
                answer,
                source,
            })
            .send()
            .await
            .map_err(|e| TutorError::Evaluation(format!("evaluation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Evaluation(format!(
                "evaluation service returned {status}: {}",
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TutorError::Evaluation(format!("invalid evaluation response: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Build a verification coordinator from the configured endpoints.
///
/// Returns `None` when no evaluator is configured, since evidence alone
/// cannot produce a verdict.
pub fn verification_from_config(config: &VerificationConfig) -> Result<Option<VerificationCoordinator>> {
    let endpoints = [
        (VerificationSourceType::Academic, &config.academic_endpoint),
        (VerificationSourceType::Books, &config.books_endpoint),
        (VerificationSourceType::Web, &config.web_endpoint),
    ];

    let Some(evaluator_endpoint) = &config.evaluator_endpoint else {
        if endpoints.iter().any(|(_, endpoint)| endpoint.is_some()) {
            warn!("evidence endpoints configured without an evaluator, verification disabled");
        }
        return Ok(None);
    };

    let evaluator = HttpEvaluator::new(evaluator_endpoint.clone(), config.timeout_secs)?;
    let mut coordinator = VerificationCoordinator::new(Arc::new(evaluator));
    for (source_type, endpoint) in endpoints {
        if let Some(endpoint) = endpoint {
            let source = HttpEvidenceSource::new(source_type, endpoint.clone(), config.timeout_secs)?;
            coordinator = coordinator.with_source(Arc::new(source));
        }
    }

    info!(sources = ?coordinator.available(), "verification enabled");
    Ok(Some(coordinator))
}
