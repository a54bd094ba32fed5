//! Tab Manager
//!
//! Owns the ordered tab strip and the active tab pointer. Always holds at
//! least one tab: closing the last one seeds a fresh normal tab.

use std::collections::HashSet;

use nimbus_navigation::{sanitize, SearchEngine, NEW_TAB_URL};

use crate::snapshot::TabSnapshot;
use crate::tab::{ReloadAction, Tab, TabId};

#[derive(Debug, Clone)]
pub struct TabManager {
    tabs: Vec<Tab>,
    active_tab_id: TabId,
    next_id: TabId,
    /// Start page for normal tabs; empty means the built-in new-tab page
    homepage: String,
}

impl TabManager {
    pub fn new() -> Self {
        Self::with_homepage(String::new())
    }

    pub fn with_homepage(homepage: impl Into<String>) -> Self {
        let mut manager = Self {
            tabs: Vec::new(),
            active_tab_id: 0,
            next_id: 1,
            homepage: homepage.into(),
        };
        manager.create_tab(false);
        manager
    }

    /// Rebuild from a saved session. The first restored tab becomes active;
    /// an empty session yields one fresh tab.
    pub fn from_session(tabs: Vec<Tab>, homepage: impl Into<String>) -> Self {
        if tabs.is_empty() {
            return Self::with_homepage(homepage);
        }

        let mut seen = HashSet::new();
        let mut tabs: Vec<Tab> = tabs
            .into_iter()
            .filter(|tab| seen.insert(tab.id))
            .map(|mut tab| {
                tab.repair();
                tab
            })
            .collect();

        // Ids at the top of the range leave no room to allocate; renumber.
        let next_id = match tabs.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1) {
            Some(next_id) => next_id,
            None => {
                tracing::warn!("Saved tab ids exhausted, renumbering session");
                for (tab, id) in tabs.iter_mut().zip(1..) {
                    tab.id = id;
                }
                tabs.len() as TabId + 1
            }
        };
        let active_tab_id = tabs[0].id;

        tracing::info!(tab_count = tabs.len(), "Restored session tabs");

        Self {
            tabs,
            active_tab_id,
            next_id,
            homepage: homepage.into(),
        }
    }

    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    pub fn set_homepage(&mut self, homepage: impl Into<String>) {
        self.homepage = homepage.into();
    }

    /// First history entry for a new tab. Incognito tabs ignore the homepage.
    fn seed_url(&self, incognito: bool) -> String {
        if incognito || self.homepage.trim().is_empty() {
            NEW_TAB_URL.to_string()
        } else {
            self.homepage.clone()
        }
    }

    fn allocate_id(&mut self) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    /// Create a new tab at the end of the strip and activate it
    pub fn create_tab(&mut self, incognito: bool) -> Tab {
        let id = self.allocate_id();
        let tab = Tab::new(id, self.seed_url(incognito), incognito);
        self.tabs.push(tab.clone());
        self.active_tab_id = id;

        tracing::debug!(tab_id = id, incognito, url = %tab.url, "Created new tab");

        tab
    }

    /// Close a tab and pick the next active one. Returns false for unknown ids.
    pub fn close_tab(&mut self, id: TabId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let closed = self.tabs.remove(index);
        let mode = closed.incognito;

        if !self.tabs.iter().any(|t| t.incognito == mode) {
            match self.tabs.iter().find(|t| t.incognito != mode) {
                Some(other) => self.active_tab_id = other.id,
                None => {
                    self.create_tab(false);
                }
            }
        } else if self.active_tab_id == id {
            // Tabs before `index` keep their positions after the removal.
            let next = self.tabs[..index]
                .iter()
                .rev()
                .find(|t| t.incognito == mode)
                .or_else(|| self.tabs.iter().find(|t| t.incognito == mode))
                .map(|t| t.id);
            if let Some(next) = next {
                self.active_tab_id = next;
            }
        }

        tracing::debug!(tab_id = id, active_tab_id = self.active_tab_id, "Closed tab");

        true
    }

    pub fn select_tab(&mut self, id: TabId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.active_tab_id = id;
        true
    }

    /// Navigate a tab to sanitized input. Returns the URL actually loaded.
    pub fn navigate(&mut self, id: TabId, input: &str, engine: SearchEngine) -> Option<String> {
        let tab = self.get_mut(id)?;
        let url = sanitize(input, engine);
        tab.navigate(url.clone());

        tracing::debug!(tab_id = id, url = %url, "Navigated tab");

        Some(url)
    }

    pub fn back(&mut self, id: TabId) -> bool {
        self.get_mut(id).is_some_and(Tab::go_back)
    }

    pub fn forward(&mut self, id: TabId) -> bool {
        self.get_mut(id).is_some_and(Tab::go_forward)
    }

    pub fn reload(&mut self, id: TabId) -> Option<ReloadAction> {
        self.get_mut(id).map(Tab::reload)
    }

    /// Unconditionally re-mount a tab's content, whatever it shows.
    pub fn force_remount(&mut self, id: TabId) -> Option<u64> {
        self.get_mut(id).map(Tab::bump_reload_key)
    }

    /// Clone a tab right after the original and activate the copy
    pub fn duplicate_tab(&mut self, id: TabId) -> Option<Tab> {
        let index = self.position(id)?;
        let new_id = self.allocate_id();
        let copy = self.tabs[index].duplicate(new_id);
        self.tabs.insert(index + 1, copy.clone());
        self.active_tab_id = new_id;

        tracing::debug!(tab_id = id, new_tab_id = new_id, "Duplicated tab");

        Some(copy)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_tab_id(&self) -> TabId {
        self.active_tab_id
    }

    /// Active tab, falling back to the first normal tab, then the first tab.
    pub fn active_tab(&self) -> Option<&Tab> {
        self.get(self.active_tab_id)
            .or_else(|| self.tabs.iter().find(|t| !t.incognito))
            .or_else(|| self.tabs.first())
    }

    /// Tabs that belong in the saved session
    pub fn persistable_tabs(&self) -> Vec<Tab> {
        self.tabs.iter().filter(|t| !t.incognito).cloned().collect()
    }

    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id,
        }
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}
