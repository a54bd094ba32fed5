//! Nimbus Core
//!
//! Coordination layer for the Nimbus browser shell. All state lives here;
//! the presentation layer renders snapshots and forwards user intent.

mod bookmarks;
mod browser;
mod config;
mod error;
mod settings;
mod shortcuts;
mod surface;

pub use bookmarks::{Bookmark, BookmarkToggle, BookmarkUpdate, Bookmarks, Folder};
pub use browser::Browser;
pub use config::Config;
pub use error::CoreError;
pub use settings::{Settings, Theme};
pub use shortcuts::{Shortcut, ShortcutOutcome};
pub use surface::{ContentSurface, SANDBOX_TOKENS};

// Re-export core components
pub use nimbus_ai::{
    AiClient, AiConfig, AiError, AspectRatio, ChatMessage, ChatSession, GroundingSource,
    InlineData, Role, SourceKind, UserLocation, VideoResolution, CHAT_ERROR_REPLY,
};
pub use nimbus_download::{
    Download, DownloadError, DownloadEvent, DownloadState, DownloadTracker, BLOB_URL_PREFIX,
};
pub use nimbus_navigation::{
    classify, sanitize, InputKind, NavigationError, SearchEngine, NEW_TAB_URL,
};
pub use nimbus_session::SessionManager;
pub use nimbus_storage::{Database, StorageError, Store, StoreKey};
pub use nimbus_tabs::{ReloadAction, Tab, TabId, TabManager, TabSnapshot};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
