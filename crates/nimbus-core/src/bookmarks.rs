//! Bookmarks and bookmark folders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nimbus_navigation::{hostname, is_bookmarkable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    /// `None` means unfiled
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(url: String, title: String, folder_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            title,
            folder_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// Partial edit; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkUpdate {
    pub url: Option<String>,
    pub title: Option<String>,
    /// `Some(None)` unfiles the bookmark
    pub folder_id: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "bookmark", rename_all = "camelCase")]
pub enum BookmarkToggle {
    Added(Bookmark),
    Removed(Bookmark),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    bookmarks: Vec<Bookmark>,
    folders: Vec<Folder>,
}

impl Bookmarks {
    pub fn new(bookmarks: Vec<Bookmark>, folders: Vec<Folder>) -> Self {
        Self { bookmarks, folders }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.bookmarks.iter().any(|b| b.url == url)
    }

    /// Bookmark the URL, or remove every bookmark for it. Internal pages
    /// and `data:` URLs are never bookmarked.
    pub fn toggle(&mut self, url: &str) -> Option<BookmarkToggle> {
        if !is_bookmarkable(url) {
            return None;
        }

        if let Some(index) = self.bookmarks.iter().position(|b| b.url == url) {
            let removed = self.bookmarks.remove(index);
            self.bookmarks.retain(|b| b.url != url);
            return Some(BookmarkToggle::Removed(removed));
        }

        let bookmark = Bookmark::new(url.to_string(), hostname(url), None);
        self.bookmarks.push(bookmark.clone());
        Some(BookmarkToggle::Added(bookmark))
    }

    /// Direct add; duplicate URLs are allowed here.
    pub fn add(&mut self, url: String, title: String, folder_id: Option<String>) -> Bookmark {
        let bookmark = Bookmark::new(url, title, folder_id);
        self.bookmarks.push(bookmark.clone());
        bookmark
    }

    pub fn update(&mut self, id: &str, update: BookmarkUpdate) -> Option<Bookmark> {
        let bookmark = self.bookmarks.iter_mut().find(|b| b.id == id)?;
        if let Some(url) = update.url {
            bookmark.url = url;
        }
        if let Some(title) = update.title {
            bookmark.title = title;
        }
        if let Some(folder_id) = update.folder_id {
            bookmark.folder_id = folder_id;
        }
        Some(bookmark.clone())
    }

    /// Re-file a bookmark; `None` moves it to the unfiled list.
    pub fn move_to(&mut self, id: &str, folder_id: Option<String>) -> Option<Bookmark> {
        self.update(
            id,
            BookmarkUpdate {
                folder_id: Some(folder_id),
                ..BookmarkUpdate::default()
            },
        )
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.id != id);
        self.bookmarks.len() != before
    }

    pub fn add_folder(&mut self, name: String) -> Folder {
        let folder = Folder::new(name);
        self.folders.push(folder.clone());
        folder
    }

    pub fn rename_folder(&mut self, id: &str, name: String) -> Option<Folder> {
        let folder = self.folders.iter_mut().find(|f| f.id == id)?;
        folder.name = name;
        Some(folder.clone())
    }

    /// Remove a folder. Its bookmarks become unfiled, never deleted.
    pub fn delete_folder(&mut self, id: &str) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            return false;
        }

        for bookmark in &mut self.bookmarks {
            if bookmark.folder_id.as_deref() == Some(id) {
                bookmark.folder_id = None;
            }
        }
        true
    }

    pub fn in_folder(&self, folder_id: Option<&str>) -> Vec<Bookmark> {
        self.bookmarks
            .iter()
            .filter(|b| b.folder_id.as_deref() == folder_id)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.bookmarks.clear();
        self.folders.clear();
    }
}
