//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use tutorgraph_core::generation::{ChatResponse, GenerationBackend};
use tutorgraph_shared::{AppConfig, GenerationConfig, Result, TutorError, validate_api_key};

const SYSTEM_PROMPT: &str = "You are a patient tutor. Explain clearly and at the learner's level.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Generation backend speaking the chat completions protocol (OpenRouter, OpenAI, ...).
pub struct ChatClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    student_id: Option<String>,
}

impl ChatClient {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            student_id: config.student_id.clone(),
        })
    }

    /// Build from app config, reading the API key from the configured env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Self::new(&config.generation, api_key)
    }
}

#[async_trait]
impl GenerationBackend for ChatClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn chat(&self, prompt: &str) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            user: self.student_id.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::Generation(format!("generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Generation(format!(
                "generation service returned {status}: {}",
                body.trim()
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| TutorError::Generation(format!("invalid generation response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TutorError::Generation("generation service returned no answer".into()))?;

        debug!(answer_len = content.len(), "completion received");
        Ok(ChatResponse { response: content })
    }
}
