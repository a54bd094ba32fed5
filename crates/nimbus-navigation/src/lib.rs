//! Nimbus Navigation
//!
//! Address bar input resolution:
//!   1. Internal scheme (`about:`, `data:`, `gemini:`) → unchanged
//!   2. Absolute `http(s)://` / `ftp://` URL → unchanged
//!   3. Bare domain (`example.com/path`) → `https://` prefixed
//!   4. Anything else → search engine query

mod engine;
mod error;
mod host;
mod input;

pub use engine::SearchEngine;
pub use error::NavigationError;
pub use host::{extract_domain, hostname, is_valid_url};
pub use input::{classify, is_bookmarkable, is_internal, sanitize, InputKind, NEW_TAB_URL};

pub type Result<T> = std::result::Result<T, NavigationError>;
