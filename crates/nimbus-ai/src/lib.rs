//! Nimbus AI Client
//!
//! Request/response marshaling for the hosted generative AI API:
//! grounded chat, text, images, video, speech and content analysis.

mod chat;
mod client;
mod config;
mod error;
mod types;
mod wire;

pub use chat::{ChatSession, CHAT_ERROR_REPLY};
pub use client::AiClient;
pub use config::AiConfig;
pub use error::AiError;
pub use types::{
    AspectRatio, ChatMessage, GroundingSource, InlineData, Role, SourceKind, UserLocation,
    VideoResolution,
};

pub type Result<T> = std::result::Result<T, AiError>;
