//! HTTP implementations of the TutorGraph collaborator traits.
//!
//! - [`ChatClient`]: OpenAI-compatible chat completions, used for generation
//! - [`HttpEvidenceSource`]: one verification evidence backend per source type
//! - [`HttpEvaluator`]: the answer evaluation service

mod chat;
mod verification;

use std::time::Duration;

use reqwest::Client;

use tutorgraph_shared::{Result, TutorError};

pub use chat::ChatClient;
pub use verification::{HttpEvaluator, HttpEvidenceSource, verification_from_config};

/// User-Agent string for outgoing requests.
const USER_AGENT: &str = concat!("TutorGraph/", env!("CARGO_PKG_VERSION"));

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TutorError::Network(format!("failed to build HTTP client: {e}")))
}
