//! Nimbus Session Management
//!
//! - The session is the ordered list of normal tabs
//! - It auto-saves on any mutation
//! - Incognito tabs never reach storage
//! - Restarting restores the saved tabs, first one active

mod manager;

pub use manager::SessionManager;
