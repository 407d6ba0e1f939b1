//! Application configuration for TutorGraph.
//!
//! User config lives at `~/.tutorgraph/tutorgraph.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TutorError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tutorgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tutorgraph";

// ---------------------------------------------------------------------------
// Config structs (matching tutorgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Corpus and ontology locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Retrieval settings.
    #[serde(default)]
    pub rag: RagConfig,

    /// Adaptive support settings.
    #[serde(default)]
    pub support: SupportConfig,

    /// Generation (chat completion) endpoint settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Verification backends.
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the corpus JSON file.
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Path to the ontology JSON file.
    #[serde(default = "default_ontology_path")]
    pub ontology_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            ontology_path: default_ontology_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    "data/corpus.json".into()
}
fn default_ontology_path() -> PathBuf {
    "data/ontology.json".into()
}

/// `[rag]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Number of passages retrieved per question.
    #[serde(default = "default_retrieve_count")]
    pub retrieve_count: usize,

    /// Results below this similarity are treated as irrelevant by the index.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            retrieve_count: default_retrieve_count(),
            min_similarity: default_min_similarity(),
        }
    }
}

fn default_retrieve_count() -> usize {
    3
}
fn default_min_similarity() -> f64 {
    0.05
}

/// `[support]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    /// How many `relatedConcepts` hops to follow (1 = direct neighbours).
    #[serde(default = "default_related_depth")]
    pub related_depth: usize,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            related_depth: default_related_depth(),
        }
    }
}

fn default_related_depth() -> usize {
    1
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model to request.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP timeout for one generation call.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Learner identifier forwarded to the provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_generation_timeout(),
            student_id: None,
        }
    }
}

fn default_endpoint() -> Url {
    Url::parse("https://openrouter.ai/api/v1/chat/completions")
        .expect("default endpoint is a valid URL")
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_generation_timeout() -> u64 {
    60
}

/// `[verification]` section. Unset endpoints mean that source is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_endpoint: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books_endpoint: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_endpoint: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_endpoint: Option<Url>,

    /// HTTP timeout for one evidence or evaluation call.
    #[serde(default = "default_verification_timeout")]
    pub timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            academic_endpoint: None,
            books_endpoint: None,
            web_endpoint: None,
            evaluator_endpoint: None,
            timeout_secs: default_verification_timeout(),
        }
    }
}

fn default_verification_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Reject option values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rag.retrieve_count == 0 {
            return Err(TutorError::config("rag.retrieve_count must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.rag.min_similarity) {
            return Err(TutorError::config(format!(
                "rag.min_similarity must be within [0, 1], got {}",
                self.rag.min_similarity
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Options for one question-answer pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RagOptions {
    /// Number of passages to retrieve (default 3).
    pub retrieve_count: usize,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            retrieve_count: default_retrieve_count(),
        }
    }
}

impl From<&AppConfig> for RagOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            retrieve_count: config.rag.retrieve_count,
        }
    }
}

/// Options for adaptive support generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportOptions {
    /// Related-concept traversal depth (default 1).
    pub related_depth: usize,
}

impl Default for SupportOptions {
    fn default() -> Self {
        Self {
            related_depth: default_related_depth(),
        }
    }
}

impl From<&AppConfig> for SupportOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            related_depth: config.support.related_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tutorgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TutorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tutorgraph/tutorgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TutorError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| TutorError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TutorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| TutorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TutorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the generation API key from the env var named in the config.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.generation.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(TutorError::config(format!(
            "generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("retrieve_count = 3"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.rag.retrieve_count, 3);
        assert_eq!(parsed.support.related_depth, 1);
        assert!(parsed.verification.academic_endpoint.is_none());
    }

    #[test]
    fn config_with_verification_endpoints() {
        let toml_str = r#"
[rag]
retrieve_count = 5

[verification]
academic_endpoint = "http://localhost:9000/academic"
evaluator_endpoint = "http://localhost:9000/evaluate"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.rag.retrieve_count, 5);
        assert_eq!(config.rag.min_similarity, 0.05);
        assert_eq!(
            config.verification.academic_endpoint.as_ref().map(Url::as_str),
            Some("http://localhost:9000/academic")
        );
        assert!(config.verification.web_endpoint.is_none());
    }

    #[test]
    fn options_from_app_config() {
        let mut app = AppConfig::default();
        app.support.related_depth = 2;
        assert_eq!(RagOptions::from(&app).retrieve_count, 3);
        assert_eq!(SupportOptions::from(&app).related_depth, 2);
    }

    #[test]
    fn zero_retrieve_count_is_rejected() {
        let mut config = AppConfig::default();
        config.rag.retrieve_count = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retrieve_count"));

        config.rag.retrieve_count = 1;
        config.rag.min_similarity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.generation.api_key_env = "TG_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
