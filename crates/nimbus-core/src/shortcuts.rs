//! Keyboard shortcuts

use serde::Serialize;

use nimbus_tabs::ReloadAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Shortcut {
    /// New tab in the active tab's privacy mode
    NewTab,
    CloseTab,
    Reload,
    FocusAddressBar,
}

impl Shortcut {
    /// Map a key press to a shortcut. `modifier` is Ctrl, or Cmd on macOS.
    pub fn from_key(key: &str, modifier: bool) -> Option<Self> {
        if !modifier {
            return None;
        }
        match key.to_ascii_lowercase().as_str() {
            "t" => Some(Shortcut::NewTab),
            "w" => Some(Shortcut::CloseTab),
            "r" => Some(Shortcut::Reload),
            "l" => Some(Shortcut::FocusAddressBar),
            _ => None,
        }
    }
}

/// Result of running a shortcut. The host must suppress the key's default
/// action whenever a shortcut matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutOutcome {
    pub shortcut: Shortcut,
    pub prevent_default: bool,
    /// The host should focus and select the address bar
    pub focus_address_bar: bool,
    /// Set when a reload ran against the active tab
    pub reload: Option<ReloadAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_modifier() {
        assert_eq!(Shortcut::from_key("t", true), Some(Shortcut::NewTab));
        assert_eq!(Shortcut::from_key("T", true), Some(Shortcut::NewTab));
        assert_eq!(Shortcut::from_key("t", false), None);
        assert_eq!(Shortcut::from_key("x", true), None);
        assert_eq!(Shortcut::from_key("l", true), Some(Shortcut::FocusAddressBar));
    }
}
