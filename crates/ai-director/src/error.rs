//! Scoring error types.

use thiserror::Error;

pub type DirectorResult<T> = Result<T, DirectorError>;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Oracle returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Frame extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
