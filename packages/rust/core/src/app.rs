//! Application readiness gate.
//!
//! Initialization runs in the background while the front end is already
//! accepting input. [`TutorApp`] publishes the orchestrator exactly once when
//! startup finishes; every request before that fails with `NotInitialized`.

use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use tutorgraph_shared::{RagOptions, Result, TutorError, VerificationSourceType};

use crate::pipeline::{Orchestrator, ProgressReporter, TutorResponse};
use crate::verification::VerificationReport;

#[derive(Default)]
pub struct TutorApp {
    orchestrator: OnceLock<Arc<Orchestrator>>,
    failure: OnceLock<String>,
}

impl TutorApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the initialized orchestrator. Only the first call succeeds.
    pub fn install(&self, orchestrator: Orchestrator) -> Result<Arc<Orchestrator>> {
        let orchestrator = Arc::new(orchestrator);
        self.orchestrator
            .set(Arc::clone(&orchestrator))
            .map_err(|_| TutorError::initialization("application is already initialized"))?;
        info!(session = %orchestrator.session_id(), "application ready");
        Ok(orchestrator)
    }

    /// Record that startup failed; later requests report this message.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "initialization failed");
        let _ = self.failure.set(message);
    }

    pub fn is_ready(&self) -> bool {
        self.orchestrator.get().is_some()
    }

    /// The live orchestrator, or why there is none yet.
    pub fn orchestrator(&self) -> Result<Arc<Orchestrator>> {
        if let Some(orchestrator) = self.orchestrator.get() {
            return Ok(Arc::clone(orchestrator));
        }
        match self.failure.get() {
            Some(message) => Err(TutorError::initialization(message.clone())),
            None => Err(TutorError::NotInitialized),
        }
    }

    pub async fn ask(
        &self,
        question: &str,
        options: &RagOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<TutorResponse> {
        self.orchestrator()?.ask_with(question, options, progress).await
    }

    pub async fn verify(&self, source_type: VerificationSourceType) -> Result<VerificationReport> {
        self.orchestrator()?.verify(source_type).await
    }
}
