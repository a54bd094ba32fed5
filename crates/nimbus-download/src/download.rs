//! Download data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    /// Transfer in progress
    Downloading,
    /// Stopped by the user; received bytes were dropped
    Paused,
    /// Payload available behind `blob_url`
    Completed,
    /// Network or HTTP error
    Failed,
    /// Cancelled by the user
    Cancelled,
}

impl DownloadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Downloading => "downloading",
            DownloadState::Paused => "paused",
            DownloadState::Completed => "completed",
            DownloadState::Failed => "failed",
            DownloadState::Cancelled => "cancelled",
        }
    }

    /// Entries in these states are dropped by `clear`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Failed | DownloadState::Cancelled
        )
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub status: DownloadState,
    /// Whole percent, 0 to 100
    pub progress: u8,
    pub blob_url: Option<String>,
    pub error: Option<String>,
    /// Hex SHA-256 of the completed payload
    pub sha256: Option<String>,
    pub total_bytes: Option<u64>,
    pub received_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Download {
    pub fn new(id: String, url: String) -> Self {
        let filename = best_effort_file_name(&url);

        Self {
            id,
            url,
            filename,
            status: DownloadState::Downloading,
            progress: 0,
            blob_url: None,
            error: None,
            sha256: None,
            total_bytes: None,
            received_bytes: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record received bytes. Progress only moves when the total is known.
    pub fn record_progress(&mut self, received: u64, total: Option<u64>) {
        self.received_bytes = received;
        self.total_bytes = total;
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = (received as f64 / total as f64 * 100.0).round();
            self.progress = percent.clamp(0.0, 100.0) as u8;
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DownloadState::Downloading
    }
}

/// Last non-empty path segment of the URL, or `download`.
pub fn best_effort_file_name(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(name) = parsed
            .path_segments()
            .and_then(|mut s| s.next_back())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return name.to_string();
        }
    }
    "download".to_string()
}
