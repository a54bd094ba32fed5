//! Download tracker
//!
//! Each transfer runs as its own task with a control channel. Status changes
//! made by the user (pause, cancel) are applied synchronously under the
//! records lock; a task only publishes while its control still says
//! `Continue`, checked under that same lock.

use chrono::Utc;
use futures_util::StreamExt;
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::download::{Download, DownloadState};
use crate::error::DownloadError;
use crate::Result;

const EVENT_CAPACITY: usize = 64;
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DownloadControl {
    Continue,
    Pause,
    Cancel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DownloadEvent {
    Updated(Download),
    Removed { id: String },
}

#[derive(Default)]
struct Inner {
    /// In start order
    records: Vec<Download>,
    /// Live control handles, one per `downloading` entry
    jobs: HashMap<String, watch::Sender<DownloadControl>>,
}

impl Inner {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|d| d.id == id)
    }

    fn signal(&mut self, id: &str, control: DownloadControl) {
        if let Some(tx) = self.jobs.remove(id) {
            let _ = tx.send(control);
        }
    }
}

struct Payload {
    bytes: Vec<u8>,
    mime_type: String,
}

pub struct DownloadTracker {
    inner: Arc<RwLock<Inner>>,
    blobs: BlobStore,
    client: reqwest::Client,
    events: broadcast::Sender<DownloadEvent>,
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            blobs: BlobStore::new(),
            client,
            events,
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DownloadEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn list(&self) -> Vec<Download> {
        self.inner.read().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<Download> {
        self.inner.read().records.iter().find(|d| d.id == id).cloned()
    }

    /// Begin a transfer. With `existing_id` the entry is reset in place,
    /// otherwise a new entry is appended.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, url: &str, existing_id: Option<&str>) -> Download {
        let id = existing_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let download = Download::new(id.clone(), url.to_string());
        let (tx, rx) = watch::channel(DownloadControl::Continue);

        {
            let mut inner = self.inner.write();
            if let Some(previous) = inner.jobs.insert(id.clone(), tx) {
                let _ = previous.send(DownloadControl::Cancel);
            }
            match inner.position(&id) {
                Some(index) => {
                    if let Some(blob_url) = inner.records[index].blob_url.take() {
                        self.blobs.revoke(&blob_url);
                    }
                    inner.records[index] = download.clone();
                }
                None => inner.records.push(download.clone()),
            }
            self.emit(DownloadEvent::Updated(download.clone()));
        }

        tracing::info!(download_id = %id, url = %url, "Started download");

        let tracker = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            tracker.run(id, url, rx).await;
        });

        download
    }

    /// Stop a running transfer. Received bytes are dropped.
    pub fn pause(&self, id: &str) -> Option<Download> {
        let mut inner = self.inner.write();
        let index = inner.position(id).filter(|i| inner.records[*i].is_active())?;
        inner.signal(id, DownloadControl::Pause);

        let download = &mut inner.records[index];
        download.status = DownloadState::Paused;
        let download = download.clone();
        self.emit(DownloadEvent::Updated(download.clone()));

        tracing::info!(download_id = %id, "Paused download");

        Some(download)
    }

    /// Restart a paused transfer from the beginning.
    pub fn resume(&self, id: &str) -> Option<Download> {
        let url = {
            let inner = self.inner.read();
            inner
                .records
                .iter()
                .find(|d| d.id == id && d.status == DownloadState::Paused)?
                .url
                .clone()
        };

        Some(self.start(&url, Some(id)))
    }

    pub fn cancel(&self, id: &str) -> Option<Download> {
        let mut inner = self.inner.write();
        let index = inner.position(id)?;
        inner.signal(id, DownloadControl::Cancel);

        let download = &mut inner.records[index];
        if let Some(blob_url) = download.blob_url.take() {
            self.blobs.revoke(&blob_url);
        }
        download.status = DownloadState::Cancelled;
        download.progress = 0;
        let download = download.clone();
        self.emit(DownloadEvent::Updated(download.clone()));

        tracing::info!(download_id = %id, "Cancelled download");

        Some(download)
    }

    /// Drop finished entries and release their payloads. Running and paused
    /// entries stay. Returns how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let (removed, kept): (Vec<Download>, Vec<Download>) = std::mem::take(&mut inner.records)
            .into_iter()
            .partition(|d| d.status.is_terminal());
        inner.records = kept;

        for download in &removed {
            if let Some(blob_url) = &download.blob_url {
                self.blobs.revoke(blob_url);
            }
            self.emit(DownloadEvent::Removed {
                id: download.id.clone(),
            });
        }

        tracing::debug!(removed = removed.len(), "Cleared finished downloads");

        removed.len()
    }

    /// Abort every transfer and release every payload.
    pub fn shutdown(&self) {
        let mut inner = self.inner.write();
        let aborted = inner.jobs.len();
        for (_, tx) in inner.jobs.drain() {
            let _ = tx.send(DownloadControl::Cancel);
        }

        for download in inner.records.iter_mut() {
            if download.is_active() {
                download.status = DownloadState::Cancelled;
                download.progress = 0;
            }
            if let Some(blob_url) = download.blob_url.take() {
                self.blobs.revoke(&blob_url);
            }
        }

        tracing::info!(aborted, "Download tracker shut down");
    }

    async fn run(self, id: String, url: String, mut control: watch::Receiver<DownloadControl>) {
        match self.transfer(&id, &url, &mut control).await {
            Ok(Some(payload)) => self.complete(&id, &control, payload),
            Ok(None) => tracing::debug!(download_id = %id, "Transfer stopped by user"),
            Err(e) => self.fail(&id, &control, &e),
        }
    }

    /// Stream the body into memory. `None` means the user stopped it.
    async fn transfer(
        &self,
        id: &str,
        url: &str,
        control: &mut watch::Receiver<DownloadControl>,
    ) -> Result<Option<Payload>> {
        let response = tokio::select! {
            _ = stopped(control) => return Ok(None),
            response = self.client.get(url).send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let total = response.content_length();
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        loop {
            tokio::select! {
                _ = stopped(control) => return Ok(None),
                chunk = stream.next() => match chunk {
                    Some(Ok(chunk)) => {
                        bytes.extend_from_slice(&chunk);
                        let received = bytes.len() as u64;
                        self.publish(id, control, |d| d.record_progress(received, total));
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }

        Ok(Some(Payload { bytes, mime_type }))
    }

    fn publish(
        &self,
        id: &str,
        control: &watch::Receiver<DownloadControl>,
        update: impl FnOnce(&mut Download),
    ) {
        let mut inner = self.inner.write();
        if *control.borrow() != DownloadControl::Continue {
            return;
        }
        if let Some(download) = inner.records.iter_mut().find(|d| d.id == id) {
            update(download);
            self.emit(DownloadEvent::Updated(download.clone()));
        }
    }

    fn complete(&self, id: &str, control: &watch::Receiver<DownloadControl>, payload: Payload) {
        let sha256 = hex_digest(&payload.bytes);
        let size = payload.bytes.len() as u64;

        let mut inner = self.inner.write();
        if *control.borrow() != DownloadControl::Continue {
            return;
        }
        inner.jobs.remove(id);

        let Some(download) = inner.records.iter_mut().find(|d| d.id == id) else {
            return;
        };
        download.blob_url = Some(self.blobs.insert(payload.bytes, payload.mime_type));
        download.status = DownloadState::Completed;
        download.progress = 100;
        download.received_bytes = size;
        download.sha256 = Some(sha256);
        download.completed_at = Some(Utc::now());
        self.emit(DownloadEvent::Updated(download.clone()));

        tracing::info!(download_id = %id, bytes = size, "Download completed");
    }

    fn fail(&self, id: &str, control: &watch::Receiver<DownloadControl>, error: &DownloadError) {
        tracing::warn!(download_id = %id, error = %error, "Download failed");

        let mut inner = self.inner.write();
        if *control.borrow() != DownloadControl::Continue {
            return;
        }
        inner.jobs.remove(id);

        if let Some(download) = inner.records.iter_mut().find(|d| d.id == id) {
            download.status = DownloadState::Failed;
            download.error = Some(error.to_string());
            self.emit(DownloadEvent::Updated(download.clone()));
        }
    }
}

impl Default for DownloadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DownloadTracker {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            blobs: self.blobs.clone(),
            client: self.client.clone(),
            events: self.events.clone(),
        }
    }
}

/// Resolves once the user pauses or cancels, or the handle is dropped.
async fn stopped(control: &mut watch::Receiver<DownloadControl>) {
    loop {
        if *control.borrow_and_update() != DownloadControl::Continue {
            return;
        }
        if control.changed().await.is_err() {
            return;
        }
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) -> String {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
        format!("{}{}", server.uri(), route)
    }

    async fn wait_for(tracker: &DownloadTracker, id: &str, status: DownloadState) -> Download {
        for _ in 0..500 {
            if let Some(download) = tracker.get(id) {
                if download.status == status {
                    return download;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("download {id} never reached {status}");
    }

    #[tokio::test]
    async fn test_completed_download_is_hashed_and_stored() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/files/hello.txt",
            ResponseTemplate::new(200).set_body_bytes(b"hello world".to_vec()),
        )
        .await;

        let tracker = DownloadTracker::new();
        let started = tracker.start(&url, None);
        assert_eq!(started.filename, "hello.txt");
        assert_eq!(started.status, DownloadState::Downloading);

        let done = wait_for(&tracker, &started.id, DownloadState::Completed).await;
        assert_eq!(done.progress, 100);
        assert_eq!(done.received_bytes, 11);
        assert_eq!(done.sha256.as_deref(), Some(HELLO_SHA256));
        assert!(done.completed_at.is_some());

        let blob = tracker.blobs().get(done.blob_url.as_deref().unwrap()).unwrap();
        assert_eq!(blob.bytes.as_slice(), b"hello world");
    }

    #[tokio::test]
    async fn test_http_error_marks_failed() {
        let server = MockServer::start().await;
        let url = serve(&server, "/missing", ResponseTemplate::new(404)).await;

        let tracker = DownloadTracker::new();
        let id = tracker.start(&url, None).id;

        let failed = wait_for(&tracker, &id, DownloadState::Failed).await;
        assert_eq!(failed.error.as_deref(), Some("HTTP error! status: 404"));
        assert!(failed.blob_url.is_none());
    }

    #[tokio::test]
    async fn test_cancel_in_flight_is_not_a_failure() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/slow.bin",
            ResponseTemplate::new(200)
                .set_body_bytes(vec![7u8; 1024])
                .set_delay(Duration::from_millis(300)),
        )
        .await;

        let tracker = DownloadTracker::new();
        let id = tracker.start(&url, None).id;
        let cancelled = tracker.cancel(&id).unwrap();
        assert_eq!(cancelled.status, DownloadState::Cancelled);
        assert_eq!(cancelled.progress, 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let download = tracker.get(&id).unwrap();
        assert_eq!(download.status, DownloadState::Cancelled);
        assert!(download.error.is_none());
        assert!(tracker.blobs().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_completed_revokes_blob() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/a.txt",
            ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()),
        )
        .await;

        let tracker = DownloadTracker::new();
        let id = tracker.start(&url, None).id;
        let done = wait_for(&tracker, &id, DownloadState::Completed).await;
        let blob_url = done.blob_url.unwrap();

        let cancelled = tracker.cancel(&id).unwrap();
        assert_eq!(cancelled.progress, 0);
        assert!(cancelled.blob_url.is_none());
        assert!(tracker.blobs().get(&blob_url).is_none());
    }

    #[tokio::test]
    async fn test_pause_then_resume_restarts() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/big.bin",
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1u8; 4096])
                .set_delay(Duration::from_millis(100)),
        )
        .await;

        let tracker = DownloadTracker::new();
        let id = tracker.start(&url, None).id;

        let paused = tracker.pause(&id).unwrap();
        assert_eq!(paused.status, DownloadState::Paused);
        assert!(tracker.pause(&id).is_none());

        let resumed = tracker.resume(&id).unwrap();
        assert_eq!(resumed.id, id);
        assert_eq!(resumed.progress, 0);
        assert_eq!(tracker.list().len(), 1);

        let done = wait_for(&tracker, &id, DownloadState::Completed).await;
        assert_eq!(done.received_bytes, 4096);
    }

    #[tokio::test]
    async fn test_clear_keeps_running_and_paused() {
        let server = MockServer::start().await;
        let ok = serve(
            &server,
            "/ok.txt",
            ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()),
        )
        .await;
        let missing = serve(&server, "/gone", ResponseTemplate::new(410)).await;
        let slow = serve(
            &server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_bytes(b"zzz".to_vec())
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let tracker = DownloadTracker::new();
        let completed = tracker.start(&ok, None).id;
        let failed = tracker.start(&missing, None).id;
        let paused = tracker.start(&slow, None).id;
        let running = tracker.start(&slow, None).id;
        tracker.pause(&paused);

        let done = wait_for(&tracker, &completed, DownloadState::Completed).await;
        wait_for(&tracker, &failed, DownloadState::Failed).await;

        assert_eq!(tracker.clear(), 2);
        let left: Vec<String> = tracker.list().into_iter().map(|d| d.id).collect();
        assert_eq!(left, vec![paused, running.clone()]);
        assert!(tracker.blobs().get(&done.blob_url.unwrap()).is_none());

        tracker.shutdown();
        assert_eq!(tracker.get(&running).unwrap().status, DownloadState::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_noops() {
        let tracker = DownloadTracker::new();
        assert!(tracker.pause("nope").is_none());
        assert!(tracker.resume("nope").is_none());
        assert!(tracker.cancel("nope").is_none());
        assert_eq!(tracker.clear(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/e.txt",
            ResponseTemplate::new(200).set_body_bytes(b"event".to_vec()),
        )
        .await;

        let tracker = DownloadTracker::new();
        let mut events = tracker.subscribe();
        let id = tracker.start(&url, None).id;

        match events.recv().await.unwrap() {
            DownloadEvent::Updated(download) => {
                assert_eq!(download.id, id);
                assert_eq!(download.status, DownloadState::Downloading);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        loop {
            if let DownloadEvent::Updated(download) = events.recv().await.unwrap() {
                if download.status == DownloadState::Completed {
                    break;
                }
            }
        }
    }
}
