//! Error types shared across Mishran crates.

use std::path::PathBuf;

/// Top-level error type for Mishran operations.
#[derive(Debug, thiserror::Error)]
pub enum MishranError {
    #[error("Segmentation error: {message}")]
    Segmentation { message: String },

    #[error("Planning error: {message}")]
    Planning { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing input: {message}")]
    MissingInput { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MishranError.
pub type MishranResult<T> = Result<T, MishranError>;

impl MishranError {
    pub fn segmentation(msg: impl Into<String>) -> Self {
        Self::Segmentation {
            message: msg.into(),
        }
    }

    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error must stop the run before any processing happens.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::FileNotFound { .. } | Self::Config { .. }
        )
    }
}
