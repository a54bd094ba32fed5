//! Main browser state container
//!
//! Owns every manager. The presentation layer only reads snapshots and
//! calls these methods.

use parking_lot::RwLock;
use std::sync::Arc;

use nimbus_ai::{AiClient, ChatMessage, ChatSession, UserLocation};
use nimbus_download::{Download, DownloadTracker};
use nimbus_navigation::SearchEngine;
use nimbus_session::SessionManager;
use nimbus_storage::{Database, Store, StoreKey};
use nimbus_tabs::{ReloadAction, Tab, TabId, TabSnapshot};

use crate::bookmarks::{Bookmark, BookmarkToggle, BookmarkUpdate, Bookmarks, Folder};
use crate::config::Config;
use crate::error::CoreError;
use crate::settings::Settings;
use crate::shortcuts::{Shortcut, ShortcutOutcome};
use crate::surface::ContentSurface;
use crate::Result;

pub struct Browser {
    config: Config,
    store: Store,
    session: SessionManager,
    downloads: DownloadTracker,
    bookmarks: Arc<RwLock<Bookmarks>>,
    settings: Arc<RwLock<Settings>>,
    chat: ChatSession,
    /// Absent when no API key is configured
    ai: Option<AiClient>,
    location: Arc<RwLock<Option<UserLocation>>>,
}

impl Browser {
    /// Open the on-disk database and load persisted state.
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Ok(Self::with_database(config, db))
    }

    /// Same as `new`, backed by a throwaway in-memory database.
    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self::with_database(config, Database::open_in_memory()?))
    }

    fn with_database(config: Config, db: Database) -> Self {
        let store = Store::new(db).with_quota(config.storage_quota_bytes);

        let settings: Settings = store.load_or_default(StoreKey::Settings);
        let bookmarks = Bookmarks::new(
            store.load_or_default(StoreKey::Bookmarks),
            store.load_or_default(StoreKey::Folders),
        );
        let session = SessionManager::new(store.clone(), settings.homepage.clone());

        let ai = match AiClient::new(config.ai.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "AI assistant disabled");
                None
            }
        };

        Self {
            config,
            store,
            session,
            downloads: DownloadTracker::new(),
            bookmarks: Arc::new(RwLock::new(bookmarks)),
            settings: Arc::new(RwLock::new(settings)),
            chat: ChatSession::new(),
            ai,
            location: Arc::new(RwLock::new(None)),
        }
    }

    /// Restore the saved session. Call once before handling input.
    pub fn initialize(&self) -> TabSnapshot {
        let snapshot = self.session.initialize();
        tracing::info!(tab_count = snapshot.len(), "Browser initialized");
        snapshot
    }

    /// Abort running downloads and release their payloads.
    pub fn shutdown(&self) {
        self.downloads.shutdown();
        tracing::info!("Browser shut down");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // === Tab operations ===

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn tabs(&self) -> TabSnapshot {
        self.session.snapshot()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.session.active_tab()
    }

    pub fn new_tab(&self, incognito: bool) -> Tab {
        self.session.create_tab(incognito)
    }

    pub fn close_tab(&self, id: TabId) -> bool {
        self.session.close_tab(id)
    }

    pub fn select_tab(&self, id: TabId) -> bool {
        self.session.select_tab(id)
    }

    /// Navigate a tab from address bar input. Blank input is ignored.
    pub fn navigate(&self, id: TabId, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let engine = self.settings.read().search_engine;
        self.session.navigate(id, input, engine)
    }

    pub fn back(&self, id: TabId) -> bool {
        self.session.back(id)
    }

    pub fn forward(&self, id: TabId) -> bool {
        self.session.forward(id)
    }

    pub fn reload(&self, id: TabId) -> Option<ReloadAction> {
        self.session.reload(id)
    }

    /// Tab context menu reload: always re-mounts.
    pub fn force_reload(&self, id: TabId) -> Option<u64> {
        self.session.force_remount(id)
    }

    pub fn duplicate_tab(&self, id: TabId) -> Option<Tab> {
        self.session.duplicate_tab(id)
    }

    pub fn content_surface(&self, id: TabId) -> Option<ContentSurface> {
        self.session.get_tab(id).map(|tab| ContentSurface::for_tab(&tab))
    }

    /// Address bar contents for the active tab; blank on internal pages.
    pub fn address_bar_text(&self) -> String {
        match self.active_tab() {
            Some(tab) if !tab.url.starts_with("gemini:") => tab.url,
            _ => String::new(),
        }
    }

    pub fn dispatch_shortcut(&self, shortcut: Shortcut) -> ShortcutOutcome {
        let active = self.active_tab();
        let mut reload = None;

        match shortcut {
            Shortcut::NewTab => {
                let incognito = active.map(|t| t.incognito).unwrap_or(false);
                self.new_tab(incognito);
            }
            Shortcut::CloseTab => {
                if let Some(tab) = active {
                    self.close_tab(tab.id);
                }
            }
            Shortcut::Reload => {
                reload = active.and_then(|tab| self.reload(tab.id));
            }
            Shortcut::FocusAddressBar => {}
        }

        ShortcutOutcome {
            shortcut,
            prevent_default: true,
            focus_address_bar: shortcut == Shortcut::FocusAddressBar,
            reload,
        }
    }

    // === Bookmarks ===

    fn persist_bookmarks(&self, bookmarks: &Bookmarks) {
        self.store.save(StoreKey::Bookmarks, bookmarks.bookmarks());
        self.store.save(StoreKey::Folders, bookmarks.folders());
    }

    fn with_bookmarks<T>(&self, f: impl FnOnce(&mut Bookmarks) -> T) -> T {
        let mut bookmarks = self.bookmarks.write();
        let result = f(&mut bookmarks);
        self.persist_bookmarks(&bookmarks);
        result
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.read().bookmarks().to_vec()
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.bookmarks.read().folders().to_vec()
    }

    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.bookmarks.read().is_bookmarked(url)
    }

    /// Bookmark or unbookmark the active tab's page.
    pub fn toggle_bookmark(&self) -> Option<BookmarkToggle> {
        let tab = self.active_tab()?;
        let toggled = self.with_bookmarks(|b| b.toggle(&tab.url))?;

        tracing::info!(url = %tab.url, added = matches!(toggled, BookmarkToggle::Added(_)), "Toggled bookmark");

        Some(toggled)
    }

    pub fn add_bookmark(&self, url: String, title: String, folder_id: Option<String>) -> Bookmark {
        self.with_bookmarks(|b| b.add(url, title, folder_id))
    }

    pub fn update_bookmark(&self, id: &str, update: BookmarkUpdate) -> Option<Bookmark> {
        self.with_bookmarks(|b| b.update(id, update))
    }

    pub fn delete_bookmark(&self, id: &str) -> bool {
        self.with_bookmarks(|b| b.delete(id))
    }

    pub fn move_bookmark(&self, id: &str, folder_id: Option<String>) -> Option<Bookmark> {
        self.with_bookmarks(|b| b.move_to(id, folder_id))
    }

    pub fn add_folder(&self, name: String) -> Folder {
        self.with_bookmarks(|b| b.add_folder(name))
    }

    pub fn rename_folder(&self, id: &str, name: String) -> Option<Folder> {
        self.with_bookmarks(|b| b.rename_folder(id, name))
    }

    pub fn delete_folder(&self, id: &str) -> bool {
        self.with_bookmarks(|b| b.delete_folder(id))
    }

    /// Remove every bookmark and folder.
    pub fn clear_browser_data(&self) {
        self.with_bookmarks(Bookmarks::clear);
        tracing::info!("Cleared bookmarks and folders");
    }

    // === Settings ===

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Replace the settings record. A new homepage applies to tabs opened
    /// from now on.
    pub fn update_settings(&self, settings: Settings) -> Settings {
        self.session.set_homepage(settings.homepage.clone());
        self.store.save(StoreKey::Settings, &settings);
        *self.settings.write() = settings.clone();

        tracing::info!(
            search_engine = %settings.search_engine,
            theme = settings.theme.as_str(),
            "Updated settings"
        );

        settings
    }

    pub fn update_settings_with(&self, f: impl FnOnce(&mut Settings)) -> Settings {
        let mut settings = self.settings();
        f(&mut settings);
        self.update_settings(settings)
    }

    /// Switch the search engine by name (`google`, `duckduckgo`/`ddg`, `bing`).
    pub fn set_search_engine(&self, name: &str) -> Result<Settings> {
        let engine: SearchEngine = name.parse()?;
        Ok(self.update_settings_with(|s| s.search_engine = engine))
    }

    // === Downloads ===

    pub fn downloads(&self) -> &DownloadTracker {
        &self.downloads
    }

    pub fn start_download(&self, url: &str) -> Download {
        self.downloads.start(url, None)
    }

    // === Assistant ===

    pub fn ai(&self) -> Option<&AiClient> {
        self.ai.as_ref()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Position reported by the host, if it has one.
    pub fn set_location(&self, location: Option<UserLocation>) {
        *self.location.write() = location;
    }

    /// Send a message to the assistant. `Ok(None)` for blank input.
    pub async fn ask(&self, text: &str) -> Result<Option<ChatMessage>> {
        let client = self.ai.as_ref().ok_or(CoreError::AiUnavailable)?;
        let location = if self.settings.read().enable_geolocation {
            *self.location.read()
        } else {
            None
        };
        Ok(self.chat.send(client, text, location).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Theme;
    use nimbus_navigation::{NavigationError, NEW_TAB_URL};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        Config::new(PathBuf::from("/nonexistent/nimbus"))
    }

    fn browser() -> Browser {
        let browser = Browser::in_memory(test_config()).unwrap();
        browser.initialize();
        browser
    }

    #[test]
    fn test_starts_with_new_tab_page() {
        let browser = browser();
        let tab = browser.active_tab().unwrap();
        assert_eq!(tab.url, NEW_TAB_URL);
        assert_eq!(browser.address_bar_text(), "");
        assert!(browser.ai().is_none());
    }

    #[test]
    fn test_navigate_uses_configured_engine() {
        let browser = browser();
        let id = browser.active_tab().unwrap().id;
        browser.update_settings_with(|s| s.search_engine = SearchEngine::DuckDuckGo);

        assert_eq!(
            browser.navigate(id, "rust book").as_deref(),
            Some("https://duckduckgo.com/?q=rust%20book")
        );
        assert!(browser.navigate(id, "   ").is_none());
        assert_eq!(browser.address_bar_text(), "https://duckduckgo.com/?q=rust%20book");
    }

    #[test]
    fn test_set_search_engine_by_name() {
        let browser = browser();
        assert_eq!(
            browser.set_search_engine("ddg").unwrap().search_engine,
            SearchEngine::DuckDuckGo
        );
        assert!(matches!(
            browser.set_search_engine("altavista"),
            Err(CoreError::Navigation(NavigationError::UnknownSearchEngine(_)))
        ));
        assert_eq!(browser.settings().search_engine, SearchEngine::DuckDuckGo);
    }

    #[test]
    fn test_state_survives_restart() {
        let db = Database::open_in_memory().unwrap();
        {
            let browser = Browser::with_database(test_config(), db.clone());
            browser.initialize();
            let id = browser.active_tab().unwrap().id;
            browser.navigate(id, "example.com");
            browser.toggle_bookmark();
            browser.add_folder("Work".to_string());
            browser.update_settings_with(|s| s.theme = Theme::Light);
            browser.new_tab(true);
        }

        let browser = Browser::with_database(test_config(), db);
        let snapshot = browser.initialize();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.tabs[0].url, "https://example.com");
        assert!(browser.is_bookmarked("https://example.com"));
        assert_eq!(browser.folders().len(), 1);
        assert_eq!(browser.settings().theme, Theme::Light);
    }

    #[test]
    fn test_homepage_applies_to_new_tabs() {
        let browser = browser();
        browser.update_settings_with(|s| s.homepage = "https://home.example".to_string());

        assert_eq!(browser.new_tab(false).url, "https://home.example");
        assert_eq!(browser.new_tab(true).url, NEW_TAB_URL);
    }

    #[test]
    fn test_toggle_bookmark_skips_new_tab_page() {
        let browser = browser();
        assert!(browser.toggle_bookmark().is_none());
        assert!(browser.bookmarks().is_empty());
    }

    #[test]
    fn test_delete_folder_keeps_bookmarks() {
        let browser = browser();
        let folder = browser.add_folder("Docs".to_string());
        let bookmark = browser.add_bookmark(
            "https://docs.rs".to_string(),
            "Docs".to_string(),
            Some(folder.id.clone()),
        );

        assert!(browser.delete_folder(&folder.id));
        assert!(browser.folders().is_empty());
        let bookmarks = browser.bookmarks();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].id, bookmark.id);
        assert!(bookmarks[0].folder_id.is_none());

        let stored: Vec<Bookmark> = browser.store().load_or_default(StoreKey::Bookmarks);
        assert!(stored[0].folder_id.is_none());
    }

    #[test]
    fn test_clear_browser_data() {
        let browser = browser();
        browser.add_folder("A".to_string());
        browser.add_bookmark("https://a.example".into(), "A".into(), None);

        browser.clear_browser_data();
        assert!(browser.bookmarks().is_empty());
        assert!(browser.folders().is_empty());
        let stored: Vec<Folder> = browser.store().load_or_default(StoreKey::Folders);
        assert!(stored.is_empty());
    }

    #[test]
    fn test_shortcuts() {
        let browser = browser();
        let first = browser.active_tab().unwrap().id;
        browser.new_tab(true);

        let outcome = browser.dispatch_shortcut(Shortcut::NewTab);
        assert!(outcome.prevent_default);
        assert!(browser.active_tab().unwrap().incognito);
        assert_eq!(browser.tabs().len(), 3);

        browser.dispatch_shortcut(Shortcut::CloseTab);
        assert_eq!(browser.tabs().len(), 2);

        browser.select_tab(first);
        let outcome = browser.dispatch_shortcut(Shortcut::Reload);
        assert_eq!(outcome.reload, Some(ReloadAction::Remount { reload_key: 1 }));

        let outcome = browser.dispatch_shortcut(Shortcut::FocusAddressBar);
        assert!(outcome.focus_address_bar);
    }

    #[test]
    fn test_content_surface_key_tracks_reloads() {
        let browser = browser();
        let id = browser.active_tab().unwrap().id;
        browser.force_reload(id);
        assert_eq!(browser.content_surface(id).unwrap().key(), format!("{id}-1"));
        assert!(browser.content_surface(999).is_none());
    }

    #[tokio::test]
    async fn test_ask_without_key_is_unavailable() {
        let browser = browser();
        assert!(matches!(
            browser.ask("hello").await,
            Err(CoreError::AiUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_ask_honors_geolocation_setting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"toolConfig": {}})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "no location used"}]}}]
            })))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.ai = config.ai.with_api_key("k").with_base_url(server.uri());
        let browser = Browser::in_memory(config).unwrap();
        browser.set_location(Some(UserLocation {
            latitude: 10.0,
            longitude: 20.0,
        }));
        browser.update_settings_with(|s| s.enable_geolocation = false);

        let reply = browser.ask("where am I?").await.unwrap().unwrap();
        assert_eq!(reply.text, "no location used");
        assert_eq!(browser.chat().len(), 2);
    }
}
