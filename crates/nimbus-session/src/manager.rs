//! Session Manager
//!
//! Wraps the tab manager, saves the session after every change and
//! publishes a fresh snapshot to subscribers.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use nimbus_navigation::SearchEngine;
use nimbus_storage::{Store, StoreKey};
use nimbus_tabs::{ReloadAction, Tab, TabId, TabManager, TabSnapshot};

pub struct SessionManager {
    tabs: Arc<RwLock<TabManager>>,
    store: Store,
    snapshots: Arc<watch::Sender<TabSnapshot>>,
}

impl SessionManager {
    /// Start with a single fresh tab. Call `initialize` to pick up the saved session.
    pub fn new(store: Store, homepage: impl Into<String>) -> Self {
        let manager = TabManager::with_homepage(homepage);
        let (tx, _rx) = watch::channel(manager.snapshot());

        Self {
            tabs: Arc::new(RwLock::new(manager)),
            store,
            snapshots: Arc::new(tx),
        }
    }

    /// Replace the in-memory tabs with the saved session, if any.
    pub fn initialize(&self) -> TabSnapshot {
        let saved: Vec<Tab> = self.store.load_or_default(StoreKey::Session);
        let restored = saved.len();

        let mut manager = self.tabs.write();
        let homepage = manager.homepage().to_string();
        *manager = TabManager::from_session(saved, homepage);
        self.commit(&manager, true);

        tracing::info!(
            restored_tabs = restored,
            active_tab_id = manager.active_tab_id(),
            "Initialized session"
        );

        manager.snapshot()
    }

    /// Apply a mutation and commit the result while the lock is still held,
    /// so saves and notifications happen in mutation order.
    fn mutate<R>(&self, f: impl FnOnce(&mut TabManager) -> R) -> R {
        let mut manager = self.tabs.write();
        let result = f(&mut manager);
        self.commit(&manager, false);
        result
    }

    fn commit(&self, manager: &TabManager, force: bool) {
        let snapshot = manager.snapshot();
        let changed = self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });

        if changed || force {
            self.persist(manager);
        }
    }

    fn persist(&self, manager: &TabManager) {
        let tabs = manager.persistable_tabs();
        if !self.store.save(StoreKey::Session, &tabs) {
            tracing::warn!(tab_count = tabs.len(), "Session was not saved");
        }
    }

    /// Receive a new snapshot after every change to the tab strip
    pub fn subscribe(&self) -> watch::Receiver<TabSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> TabSnapshot {
        self.tabs.read().snapshot()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.tabs.read().active_tab().cloned()
    }

    pub fn get_tab(&self, id: TabId) -> Option<Tab> {
        self.tabs.read().get(id).cloned()
    }

    /// Only affects tabs created from now on.
    pub fn set_homepage(&self, homepage: impl Into<String>) {
        self.tabs.write().set_homepage(homepage);
    }

    pub fn create_tab(&self, incognito: bool) -> Tab {
        let tab = self.mutate(|m| m.create_tab(incognito));
        tracing::info!(tab_id = tab.id, incognito, "Opened tab");
        tab
    }

    pub fn close_tab(&self, id: TabId) -> bool {
        let closed = self.mutate(|m| m.close_tab(id));
        if closed {
            tracing::info!(tab_id = id, "Closed tab");
        }
        closed
    }

    pub fn select_tab(&self, id: TabId) -> bool {
        self.mutate(|m| m.select_tab(id))
    }

    pub fn navigate(&self, id: TabId, input: &str, engine: SearchEngine) -> Option<String> {
        self.mutate(|m| m.navigate(id, input, engine))
    }

    pub fn back(&self, id: TabId) -> bool {
        self.mutate(|m| m.back(id))
    }

    pub fn forward(&self, id: TabId) -> bool {
        self.mutate(|m| m.forward(id))
    }

    pub fn reload(&self, id: TabId) -> Option<ReloadAction> {
        self.mutate(|m| m.reload(id))
    }

    pub fn force_remount(&self, id: TabId) -> Option<u64> {
        self.mutate(|m| m.force_remount(id))
    }

    pub fn duplicate_tab(&self, id: TabId) -> Option<Tab> {
        self.mutate(|m| m.duplicate_tab(id))
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
            store: self.store.clone(),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}
