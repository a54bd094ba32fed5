//! Tab data structure

use serde::{Deserialize, Serialize};

use nimbus_navigation::is_internal;

pub type TabId = u64;

/// What the host surface must do to honor a reload request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ReloadAction {
    /// Internal page: re-mount content keyed by the new reload key
    Remount { reload_key: u64 },
    /// External page: ask the embedded frame to reload itself
    ReloadFrame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    /// URL currently shown; always `history[history_index]`
    pub url: String,
    /// Visited URLs in order
    pub history: Vec<String>,
    /// Cursor into `history`
    pub history_index: usize,
    /// Bumped to force the content surface to re-mount
    #[serde(default)]
    pub reload_key: u64,
    /// Private tabs are never written to the saved session
    #[serde(default)]
    pub incognito: bool,
}

impl Tab {
    pub fn new(id: TabId, url: String, incognito: bool) -> Self {
        Self {
            id,
            history: vec![url.clone()],
            url,
            history_index: 0,
            reload_key: 0,
            incognito,
        }
    }

    /// Branch-on-navigate: forward entries past the cursor are discarded.
    pub fn navigate(&mut self, url: String) {
        self.history.truncate(self.history_index + 1);
        self.history.push(url.clone());
        self.history_index = self.history.len() - 1;
        self.url = url;
    }

    pub fn can_go_back(&self) -> bool {
        self.history_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.history_index + 1 < self.history.len()
    }

    pub fn go_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.move_to(self.history_index - 1);
        true
    }

    pub fn go_forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.move_to(self.history_index + 1);
        true
    }

    fn move_to(&mut self, index: usize) {
        self.history_index = index;
        self.url = self.history[index].clone();
    }

    pub fn bump_reload_key(&mut self) -> u64 {
        self.reload_key += 1;
        self.reload_key
    }

    pub fn reload(&mut self) -> ReloadAction {
        if self.is_internal() {
            ReloadAction::Remount {
                reload_key: self.bump_reload_key(),
            }
        } else {
            ReloadAction::ReloadFrame
        }
    }

    /// Copy of this tab under a new id, with a fresh reload key.
    pub fn duplicate(&self, id: TabId) -> Self {
        Self {
            id,
            reload_key: 0,
            ..self.clone()
        }
    }

    pub fn is_internal(&self) -> bool {
        is_internal(&self.url)
    }

    /// Restore the history invariants on a record read from storage.
    pub fn repair(&mut self) {
        if self.history.is_empty() {
            self.history.push(self.url.clone());
        }
        if self.history_index >= self.history.len() {
            self.history_index = self.history.len() - 1;
        }
        self.url = self.history[self.history_index].clone();
    }
}
