//! Error types for TutorGraph.
//!
//! Library crates use [`TutorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::VerificationSourceType;

/// Top-level error type for all TutorGraph operations.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// Startup could not complete (corpus/ontology load, missing capability).
    #[error("initialization error: {message}")]
    Initialization { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// JSON parsing or data-shape error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The question was empty or whitespace only.
    #[error("question is empty")]
    EmptyQuestion,

    /// A question was asked before the orchestrator finished initializing.
    #[error("the assistant is not initialized yet")]
    NotInitialized,

    /// The requested operation is already in flight.
    #[error("{operation} is already in progress")]
    Busy { operation: String },

    /// The generation capability failed. The message is the upstream one.
    #[error("{0}")]
    Generation(String),

    /// The similarity index failed.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Data validation error (invalid argument, out-of-range option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Evidence gathering failed for one verification source.
    #[error("{source_type} verification failed: {message}")]
    Evidence {
        source_type: VerificationSourceType,
        message: String,
    },

    /// The evaluation capability failed.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Verification was requested before any question was answered.
    #[error("no answered question to verify")]
    NothingToVerify,

    /// Network/HTTP transport error.
    #[error("network error: {0}")]
    Network(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TutorError>;

/// Coarse failure class, used by callers to decide how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fatal to startup; no query can proceed.
    Initialization,
    /// The question pipeline aborted; retry is possible.
    Query,
    /// One verification aborted; the displayed answer is unaffected.
    Verification,
    /// Transport-level failure outside any pipeline.
    Network,
}

impl TutorError {
    /// Create an initialization error from any displayable message.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a busy error for the named operation.
    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    /// Create an evidence-gathering error for one source type.
    pub fn evidence(source_type: VerificationSourceType, msg: impl Into<String>) -> Self {
        Self::Evidence {
            source_type,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Which recovery class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Initialization { .. } | Self::Config { .. } | Self::Parse { .. } | Self::Io { .. } => {
                ErrorCategory::Initialization
            }
            Self::EmptyQuestion
            | Self::NotInitialized
            | Self::Busy { .. }
            | Self::Generation(_)
            | Self::Retrieval(_)
            | Self::Validation { .. } => ErrorCategory::Query,
            Self::Evidence { .. } | Self::Evaluation(_) | Self::NothingToVerify => {
                ErrorCategory::Verification
            }
            Self::Network(_) => ErrorCategory::Network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TutorError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = TutorError::evidence(VerificationSourceType::Academic, "HTTP 503");
        assert_eq!(err.to_string(), "academic verification failed: HTTP 503");
    }

    #[test]
    fn generation_message_is_passed_through() {
        let err = TutorError::Generation("upstream rate limit".into());
        assert_eq!(err.to_string(), "upstream rate limit");
    }

    #[test]
    fn categories() {
        assert_eq!(
            TutorError::initialization("corpus missing").category(),
            ErrorCategory::Initialization
        );
        assert_eq!(TutorError::EmptyQuestion.category(), ErrorCategory::Query);
        assert_eq!(TutorError::busy("question").category(), ErrorCategory::Query);
        assert_eq!(
            TutorError::NothingToVerify.category(),
            ErrorCategory::Verification
        );
        assert_eq!(
            TutorError::Evaluation("bad".into()).category(),
            ErrorCategory::Verification
        );
    }
}
