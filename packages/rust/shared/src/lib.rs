//! Shared types, error model, and configuration for TutorGraph.
//!
//! This crate is the foundation depended on by all other TutorGraph crates.
//! It provides:
//! - [`TutorError`]: the unified error type
//! - Domain types ([`Document`], [`RetrievalResult`], [`ConceptNode`], [`AdaptiveSupport`], ...)
//! - Configuration ([`AppConfig`], [`RagOptions`], [`SupportOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DataConfig, GenerationConfig, RagConfig, RagOptions, SupportConfig,
    SupportOptions, VerificationConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_api_key,
};
pub use error::{ErrorCategory, Result, TutorError};
pub use types::{
    AdaptiveSupport, ConceptId, ConceptNode, Document, DocumentMetadata, Evaluation, Evidence,
    Exchange, QueryExpansion, RetrievalResult, SessionId, SupportCategory, VerificationSource,
    VerificationSourceType,
};
