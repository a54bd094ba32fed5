//! Nimbus Tab Management
//!
//! An ordered set of tabs, each with its own back/forward history, and a
//! pointer to the active tab. Normal and incognito tabs share one strip.
//!
//! Every operation that names a tab id is a silent no-op when the id is
//! unknown: stale ids coming from the UI never produce errors.

mod manager;
mod snapshot;
mod tab;

pub use manager::TabManager;
pub use snapshot::TabSnapshot;
pub use tab::{ReloadAction, Tab, TabId};
