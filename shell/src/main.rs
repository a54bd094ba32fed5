//! Nimbus Browser - headless shell
//!
//! Reads one command per line from stdin and prints a JSON reply per line.

mod commands;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

use commands::{Command, CommandResult};
use nimbus_core::{Browser, Config, DownloadEvent};

fn load_config() -> anyhow::Result<Config> {
    let defaults = Config::from_env();
    let path = defaults.config_path();
    if path.exists() {
        return Config::load(&path).with_context(|| format!("loading {}", path.display()));
    }
    Ok(defaults)
}

/// Log download progress until the tracker goes away. Returns the number of
/// events seen.
async fn log_download_events(mut events: broadcast::Receiver<DownloadEvent>) -> usize {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(DownloadEvent::Updated(download)) => tracing::debug!(
                id = %download.id,
                status = %download.status,
                progress = download.progress,
                "Download updated"
            ),
            Ok(DownloadEvent::Removed { id }) => tracing::debug!(id = %id, "Download removed"),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Download event log fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        }
        seen += 1;
    }
    seen
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nimbus_core::init_logging();

    let config = load_config()?;
    let browser = Browser::new(config).context("opening browser state")?;
    browser.initialize();

    tokio::spawn(log_download_events(browser.downloads().subscribe()));

    tracing::info!("Nimbus shell started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => commands::execute(&browser, command).await,
            Err(e) => serde_json::to_value(CommandResult::<()>::err(e))?,
        };
        println!("{}", reply);
    }

    browser.shutdown();
    Ok(())
}
