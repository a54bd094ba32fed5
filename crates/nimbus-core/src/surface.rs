//! What the host should mount for a tab's content area

use serde::Serialize;

use nimbus_navigation::NEW_TAB_URL;
use nimbus_tabs::Tab;

/// Capabilities granted to embedded pages
pub const SANDBOX_TOKENS: [&str; 11] = [
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentSurface {
    /// Built-in new tab page, rendered by the host
    Internal { key: String },
    /// Sandboxed frame pointed at `src`
    Frame {
        key: String,
        src: String,
        sandbox: String,
    },
}

impl ContentSurface {
    /// The key changes whenever the tab's reload key does, forcing a re-mount.
    pub fn for_tab(tab: &Tab) -> Self {
        let key = format!("{}-{}", tab.id, tab.reload_key);
        if tab.url == NEW_TAB_URL {
            ContentSurface::Internal { key }
        } else {
            ContentSurface::Frame {
                key,
                src: tab.url.clone(),
                sandbox: SANDBOX_TOKENS.join(" "),
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ContentSurface::Internal { key } | ContentSurface::Frame { key, .. } => key,
        }
    }
}
