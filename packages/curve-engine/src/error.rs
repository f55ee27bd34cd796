use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Index offset out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Index kind mismatch: expected {expected}, got {actual}")]
    IndexKindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
