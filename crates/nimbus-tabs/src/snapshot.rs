//! Read-only view of the tab strip handed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::tab::{Tab, TabId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub tabs: Vec<Tab>,
    pub active_tab_id: TabId,
}

impl TabSnapshot {
    /// Active tab, falling back to the first normal tab, then the first tab.
    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.id == self.active_tab_id)
            .or_else(|| self.tabs.iter().find(|t| !t.incognito))
            .or_else(|| self.tabs.first())
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
