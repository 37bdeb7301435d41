#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("workspace error: {0}")]
    Workspace(#[from] bladestack::Error),

    #[error("scenario file does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("step {step}: {message}")]
    InvalidStep { step: usize, message: String },

    #[error("step {step}: expected {field} = {expected}, got {actual}")]
    ExpectationFailed {
        step: usize,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ExpectationFailed { .. } => 2,
            Self::DigestMismatch { .. } => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid_step(step: usize, message: impl Into<String>) -> Self {
        Self::InvalidStep {
            step,
            message: message.into(),
        }
    }
}
