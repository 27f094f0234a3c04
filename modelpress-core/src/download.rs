//! Checkpoint download from the model hub.
//!
//! Weight files are fetched over plain HTTPS from `resolve/main` URLs and
//! streamed to disk; nothing is buffered in memory beyond one chunk.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::catalog::CatalogEntry;
use crate::error::{PublishError, Result};

const USER_AGENT: &str = concat!("modelpress/", env!("CARGO_PKG_VERSION"));

/// Summary of one completed download.
#[derive(Debug, Clone)]
pub struct FetchSummary {
    /// URL the weights were fetched from.
    pub url: String,
    /// Bytes written to the destination file.
    pub bytes: u64,
    /// Wall-clock duration of the transfer.
    pub elapsed: Duration,
}

/// Streaming downloader for hub weight files.
pub struct Downloader {
    client: Client,
    hub_base_url: String,
    show_progress: bool,
}

impl Downloader {
    /// Create a downloader against a hub base URL.
    ///
    /// The timeout covers the whole transfer; hub checkpoints reach into the
    /// gigabytes, so callers should pass a generous value.
    pub fn new(hub_base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PublishError::download(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            hub_base_url: hub_base_url.into(),
            show_progress: false,
        })
    }

    /// Show a byte progress bar on stderr during transfers.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download the weights file for `entry` to `dest`.
    ///
    /// The body is streamed to a `.part` sibling and renamed into place once
    /// the transfer completes, so `dest` is never left truncated. Any
    /// existing file at `dest` is replaced.
    pub async fn fetch(&self, entry: &CatalogEntry, dest: &Path) -> Result<FetchSummary> {
        let url = entry.weights_url(&self.hub_base_url);
        debug!(url = %url, dest = %dest.display(), "fetching weights");

        let started = Instant::now();
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PublishError::download(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let bar = self.progress_bar(entry.name, response.content_length());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let part = part_path(dest);
        let mut file = fs::File::create(&part).await?;

        let mut bytes: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
            if let Some(bar) = &bar {
                bar.set_position(bytes);
            }
        }
        file.flush().await?;
        drop(file);
        fs::rename(&part, dest).await?;

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        let elapsed = started.elapsed();
        info!(
            name = entry.name,
            bytes,
            elapsed_secs = elapsed.as_secs_f64(),
            "downloaded weights"
        );

        Ok(FetchSummary { url, bytes, elapsed })
    }

    fn progress_bar(&self, name: &str, total: Option<u64>) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            }
            // Hub responses without Content-Length still stream; show a spinner.
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        bar.set_message(name.to_string());
        Some(bar)
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_part_path_appends_suffix() {
        let part = part_path(Path::new("/tmp/pytorch_model.bin"));
        assert_eq!(part, Path::new("/tmp/pytorch_model.bin.part"));
    }

    #[tokio::test]
    async fn test_fetch_streams_to_dest() {
        let server = MockServer::start().await;
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

        Mock::given(method("GET"))
            .and(path(
                "/google/bert_uncased_L-2_H-128_A-2/resolve/main/pytorch_model.bin",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("pytorch_model.bin");
        let downloader = Downloader::new(server.uri(), 30).unwrap();
        let entry = catalog::find("bert-tiny").unwrap();

        let summary = downloader.fetch(entry, &dest).await.unwrap();
        assert_eq!(summary.bytes, payload.len() as u64);
        assert!(summary.url.ends_with("/resolve/main/pytorch_model.bin"));
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_fetch_replaces_existing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("pytorch_model.bin");
        std::fs::write(&dest, b"stale contents from an earlier run").unwrap();

        let downloader = Downloader::new(server.uri(), 30).unwrap();
        let entry = catalog::find("bert-mini").unwrap();
        downloader.fetch(entry, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_fetch_rejects_http_error_before_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("pytorch_model.bin");
        let downloader = Downloader::new(server.uri(), 30).unwrap();
        let entry = catalog::find("bert-small").unwrap();

        let err = downloader.fetch(entry, &dest).await.unwrap_err();
        assert!(matches!(err, PublishError::Download(_)));
        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
