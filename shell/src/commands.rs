//! Line commands understood by the shell

use serde::Serialize;
use serde_json::Value;

use nimbus_core::{Browser, Shortcut, TabId, Theme};

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewTab { incognito: bool },
    Close(TabId),
    Select(TabId),
    /// Navigate the active tab
    Open(String),
    Back,
    Forward,
    Reload,
    Duplicate(TabId),
    Tabs,
    Key(Shortcut),
    ToggleBookmark,
    Bookmarks,
    AddFolder(String),
    DeleteFolder(String),
    ClearData,
    Download(String),
    Pause(String),
    Resume(String),
    Cancel(String),
    Downloads,
    ClearDownloads,
    Ask(String),
    Settings,
    /// Engine name, validated by the browser
    Engine(String),
    Theme(Theme),
    Homepage(String),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let text = || -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("{} needs an argument", name))
            } else {
                Ok(rest.to_string())
            }
        };
        let tab_id = || -> Result<TabId, String> {
            rest.parse()
                .map_err(|_| format!("Invalid tab id: {:?}", rest))
        };

        let command = match name {
            "new" => Command::NewTab { incognito: false },
            "incognito" => Command::NewTab { incognito: true },
            "close" => Command::Close(tab_id()?),
            "select" => Command::Select(tab_id()?),
            "open" => Command::Open(text()?),
            "back" => Command::Back,
            "forward" => Command::Forward,
            "reload" => Command::Reload,
            "dup" => Command::Duplicate(tab_id()?),
            "tabs" => Command::Tabs,
            "key" => Command::Key(
                Shortcut::from_key(&text()?, true)
                    .ok_or_else(|| format!("No shortcut for key: {}", rest))?,
            ),
            "bookmark" => Command::ToggleBookmark,
            "bookmarks" => Command::Bookmarks,
            "folder" => Command::AddFolder(text()?),
            "rmfolder" => Command::DeleteFolder(text()?),
            "clear-data" => Command::ClearData,
            "download" => Command::Download(text()?),
            "pause" => Command::Pause(text()?),
            "resume" => Command::Resume(text()?),
            "cancel" => Command::Cancel(text()?),
            "downloads" => Command::Downloads,
            "clear-downloads" => Command::ClearDownloads,
            "ask" => Command::Ask(text()?),
            "settings" => Command::Settings,
            "engine" => Command::Engine(text()?),
            "theme" => Command::Theme(text()?.parse()?),
            "homepage" => Command::Homepage(rest.to_string()),
            "quit" | "exit" => Command::Quit,
            "" => return Err("Empty command".to_string()),
            other => return Err(format!("Unknown command: {}", other)),
        };

        Ok(command)
    }
}

fn respond<T: Serialize>(result: CommandResult<T>) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

fn found<T: Serialize>(value: Option<T>, what: &str) -> Value {
    match value {
        Some(value) => respond(CommandResult::ok(value)),
        None => respond(CommandResult::<T>::err(format!("{} not found", what))),
    }
}

fn active_id(browser: &Browser) -> Option<TabId> {
    browser.active_tab().map(|t| t.id)
}

/// Run a command and render its JSON reply.
pub async fn execute(browser: &Browser, command: Command) -> Value {
    match command {
        Command::NewTab { incognito } => respond(CommandResult::ok(browser.new_tab(incognito))),
        Command::Close(id) => respond(CommandResult::ok(browser.close_tab(id))),
        Command::Select(id) => respond(CommandResult::ok(browser.select_tab(id))),
        Command::Open(input) => {
            let url = active_id(browser).and_then(|id| browser.navigate(id, &input));
            found(url, "Active tab")
        }
        Command::Back => respond(CommandResult::ok(
            active_id(browser).is_some_and(|id| browser.back(id)),
        )),
        Command::Forward => respond(CommandResult::ok(
            active_id(browser).is_some_and(|id| browser.forward(id)),
        )),
        Command::Reload => found(
            active_id(browser).and_then(|id| browser.reload(id)),
            "Active tab",
        ),
        Command::Duplicate(id) => found(browser.duplicate_tab(id), "Tab"),
        Command::Tabs => respond(CommandResult::ok(browser.tabs())),
        Command::Key(shortcut) => respond(CommandResult::ok(browser.dispatch_shortcut(shortcut))),
        Command::ToggleBookmark => found(browser.toggle_bookmark(), "Bookmarkable page"),
        Command::Bookmarks => respond(CommandResult::ok(serde_json::json!({
            "bookmarks": browser.bookmarks(),
            "folders": browser.folders(),
        }))),
        Command::AddFolder(name) => respond(CommandResult::ok(browser.add_folder(name))),
        Command::DeleteFolder(id) => respond(CommandResult::ok(browser.delete_folder(&id))),
        Command::ClearData => {
            browser.clear_browser_data();
            respond(CommandResult::ok(true))
        }
        Command::Download(url) => respond(CommandResult::ok(browser.start_download(&url))),
        Command::Pause(id) => found(browser.downloads().pause(&id), "Active download"),
        Command::Resume(id) => found(browser.downloads().resume(&id), "Paused download"),
        Command::Cancel(id) => found(browser.downloads().cancel(&id), "Download"),
        Command::Downloads => respond(CommandResult::ok(browser.downloads().list())),
        Command::ClearDownloads => respond(CommandResult::ok(browser.downloads().clear())),
        Command::Ask(text) => match browser.ask(&text).await {
            Ok(reply) => respond(CommandResult::ok(reply)),
            Err(e) => respond(CommandResult::<()>::err(e.to_string())),
        },
        Command::Settings => respond(CommandResult::ok(browser.settings())),
        Command::Engine(name) => match browser.set_search_engine(&name) {
            Ok(settings) => respond(CommandResult::ok(settings)),
            Err(e) => respond(CommandResult::<()>::err(e.to_string())),
        },
        Command::Theme(theme) => respond(CommandResult::ok(
            browser.update_settings_with(|s| s.theme = theme),
        )),
        Command::Homepage(homepage) => respond(CommandResult::ok(
            browser.update_settings_with(|s| s.homepage = homepage),
        )),
        Command::Quit => respond(CommandResult::ok(true)),
    }
}
