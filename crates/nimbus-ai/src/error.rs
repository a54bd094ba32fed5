//! AI client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response contained no usable content")]
    EmptyResponse,

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Operation still running after {attempts} polls")]
    OperationTimedOut { attempts: u32 },

    #[error("Aspect ratio {0} is not supported for video")]
    UnsupportedAspectRatio(&'static str),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}
