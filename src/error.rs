//! Error types for shellcomp

use thiserror::Error;

/// Errors raised while building trees, resolving requests, or generating scripts.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The completion request could not be interpreted.
    #[error("cannot resolve completion request: {0}")]
    Resolution(String),

    /// The command tree violates a structural invariant.
    #[error("invalid command tree: {0}")]
    Tree(String),

    /// No script generator exists for the requested shell.
    #[error("unsupported shell '{0}' (expected one of: bash, zsh, fish, powershell)")]
    UnsupportedShell(String),

    /// A declarative tree spec could not be parsed.
    #[error("invalid completion spec: {0}")]
    Spec(String),

    /// Completion output could not be decoded.
    #[error("malformed completion output: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::Spec(err.to_string())
    }
}

impl From<serde_yaml::Error> for CompletionError {
    fn from(err: serde_yaml::Error) -> Self {
        CompletionError::Spec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompletionError>;
