//! Nimbus Storage Layer
//!
//! Flat key-value persistence for browser state. Every logical key holds one
//! JSON document; reads fall back to defaults and writes are best-effort.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::{Store, StoreKey, DEFAULT_QUOTA_BYTES};

pub type Result<T> = std::result::Result<T, StorageError>;
