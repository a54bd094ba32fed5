//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] nimbus_storage::StorageError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] nimbus_navigation::NavigationError),

    #[error("AI error: {0}")]
    Ai(#[from] nimbus_ai::AiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI assistant is not configured")]
    AiUnavailable,
}
