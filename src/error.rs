//! Error types for BetterRest

use thiserror::Error;

/// Text shown to a person when an estimate cannot be produced.
pub const GENERIC_FAILURE_MESSAGE: &str = "There was an error calculating your bedtime.";

/// Errors that can occur while estimating a bedtime
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EstimationError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            EstimationError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            EstimationError::Inference(_) => "INFERENCE_FAILED",
            EstimationError::InvalidInput(_) => "INVALID_INPUT",
            EstimationError::Config(_) => "CONFIG_ERROR",
            EstimationError::Json(_) => "JSON_ERROR",
        }
    }

    /// Human-readable message that never exposes internal detail.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}
