//! Nimbus Download Tracker
//!
//! - Downloads stream into memory and end up behind an object-reference URL
//! - Pausing drops the received bytes; resuming starts over from byte zero
//! - Cancelling revokes the object-reference URL
//! - User aborts are never reported as failures

mod blob;
mod download;
mod error;
mod tracker;

pub use blob::{Blob, BlobStore, BLOB_URL_PREFIX};
pub use download::{best_effort_file_name, Download, DownloadState};
pub use error::DownloadError;
pub use tracker::{DownloadEvent, DownloadTracker};

pub type Result<T> = std::result::Result<T, DownloadError>;
