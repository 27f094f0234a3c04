//! The publish pipeline: download, convert, upload, one model at a time.
//!
//! Runs are strictly sequential and fail-fast. Each checkpoint goes through
//! the same three steps against a per-model scratch directory, which is
//! removed before the next checkpoint starts unless the configuration says
//! to keep it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::catalog::{self, CatalogEntry, ARTIFACT_FILE, SOURCE_WEIGHTS_FILE};
use crate::config::PublishConfig;
use crate::convert;
use crate::download::Downloader;
use crate::error::{PublishError, Result};
use crate::store::{ArtifactStore, StoreLocation};

/// Result of publishing one checkpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub name: String,
    pub repo: String,
    pub object_key: String,
    pub tensor_count: usize,
    pub bytes_fetched: u64,
    pub bytes_uploaded: u64,
    pub artifact_sha256: String,
}

/// Result of a whole publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub version: String,
    pub store: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PublishOutcome>,
}

/// Sequential checkpoint publisher.
pub struct Publisher {
    config: PublishConfig,
    downloader: Downloader,
    store: ArtifactStore,
    location: StoreLocation,
}

impl Publisher {
    /// Build a publisher from configuration.
    pub fn new(config: PublishConfig) -> Result<Self> {
        config.validate()?;
        let location = StoreLocation::parse(&config.store_url)?;
        let store = ArtifactStore::open(&location)?;
        let downloader = Downloader::new(config.hub_base_url.clone(), config.http_timeout_secs)?;
        Ok(Self {
            config,
            downloader,
            store,
            location,
        })
    }

    /// Show download progress bars during transfers.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.downloader = self.downloader.with_progress(show);
        self
    }

    /// Resolve the catalog entries selected by `names`.
    ///
    /// An empty selection means the whole catalog, in catalog order. Unknown
    /// names fail the whole selection before any network I/O happens.
    pub fn select(names: &[String]) -> Result<Vec<&'static CatalogEntry>> {
        if names.is_empty() {
            return Ok(catalog::CATALOG.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                catalog::find(name).ok_or_else(|| PublishError::UnknownModel(name.clone()))
            })
            .collect()
    }

    /// Publish one checkpoint: download, convert, upload.
    pub async fn publish(&self, entry: &CatalogEntry) -> Result<PublishOutcome> {
        let object_key = entry.object_key(&self.config.version);
        info!(name = entry.name, repo = entry.repo, key = %object_key, "publishing checkpoint");

        let scratch = self.scratch_dir(entry.name);
        tokio::fs::create_dir_all(&scratch).await?;
        let weights = scratch.join(SOURCE_WEIGHTS_FILE);
        let artifact = scratch.join(ARTIFACT_FILE);

        let fetched = self.downloader.fetch(entry, &weights).await?;

        let conversion = {
            let weights = weights.clone();
            let artifact = artifact.clone();
            tokio::task::spawn_blocking(move || convert::convert_checkpoint(&weights, &artifact))
                .await
                .map_err(|e| PublishError::convert(format!("conversion task failed: {}", e)))??
        };

        let artifact_sha256 = file_sha256(&artifact).await?;
        let bytes_uploaded = self.store.put_file(&object_key, &artifact).await?;

        if !self.config.keep_scratch {
            tokio::fs::remove_dir_all(&scratch).await?;
        }

        info!(
            name = entry.name,
            key = %object_key,
            sha256 = %artifact_sha256,
            "published checkpoint"
        );

        Ok(PublishOutcome {
            name: entry.name.to_string(),
            repo: entry.repo.to_string(),
            object_key,
            tensor_count: conversion.tensor_count,
            bytes_fetched: fetched.bytes,
            bytes_uploaded,
            artifact_sha256,
        })
    }

    /// Publish the selected checkpoints in order, stopping at the first failure.
    pub async fn publish_all(&self, names: &[String]) -> Result<PublishReport> {
        let entries = Self::select(names)?;
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            outcomes.push(self.publish(entry).await?);
        }
        Ok(PublishReport {
            version: self.config.version.clone(),
            store: self.location.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        })
    }

    /// Whether the artifact for `entry` already exists in the store.
    pub async fn published(&self, entry: &CatalogEntry) -> Result<bool> {
        self.store
            .exists(&entry.object_key(&self.config.version))
            .await
    }

    fn scratch_dir(&self, name: &str) -> PathBuf {
        match &self.config.scratch_dir {
            Some(dir) => dir.join(name),
            None => std::env::temp_dir().join("modelpress").join(name),
        }
    }
}

/// Hex-encoded SHA-256 of a file's contents.
///
/// Streams the file in chunks; checkpoints reach into the gigabytes, so the
/// whole artifact is never held in memory.
pub async fn file_sha256(path: &Path) -> Result<String> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1 << 20];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Atomically write a run report as pretty-printed JSON.
///
/// Writes to a `.tmp` sibling then renames into place, creating parent
/// directories as needed.
pub fn write_report(path: &Path, report: &PublishReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn memory_config() -> PublishConfig {
        PublishConfig {
            store_url: "memory:".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_empty_is_whole_catalog() {
        let entries = Publisher::select(&[]).unwrap();
        assert_eq!(entries.len(), catalog::CATALOG.len());
        assert_eq!(entries[0].name, "bert-base-uncased");
    }

    #[test]
    fn test_select_preserves_request_order() {
        let names = vec!["bert-mini".to_string(), "bert-tiny".to_string()];
        let entries = Publisher::select(&names).unwrap();
        assert_eq!(entries[0].name, "bert-mini");
        assert_eq!(entries[1].name, "bert-tiny");
    }

    #[test]
    fn test_select_rejects_unknown_name() {
        let names = vec!["bert-tiny".to_string(), "bert-huge".to_string()];
        let err = Publisher::select(&names).unwrap_err();
        assert!(matches!(err, PublishError::UnknownModel(name) if name == "bert-huge"));
    }

    #[test]
    fn test_scratch_dir_uses_configured_root() {
        let config = PublishConfig {
            scratch_dir: Some(PathBuf::from("/var/tmp/scratch")),
            ..memory_config()
        };
        let publisher = Publisher::new(config).unwrap();
        assert_eq!(
            publisher.scratch_dir("bert-tiny"),
            PathBuf::from("/var/tmp/scratch/bert-tiny")
        );
    }

    #[tokio::test]
    async fn test_publish_skips_upload_when_conversion_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a checkpoint".to_vec()))
            .mount(&server)
            .await;

        let scratch = tempfile::TempDir::new().unwrap();
        let config = PublishConfig {
            hub_base_url: server.uri(),
            scratch_dir: Some(scratch.path().to_path_buf()),
            ..memory_config()
        };
        let publisher = Publisher::new(config).unwrap();
        let entry = catalog::find("bert-tiny").unwrap();

        let err = publisher.publish(entry).await.unwrap_err();
        assert!(matches!(err, PublishError::Convert(_)));
        // Nothing reaches the store when conversion fails.
        assert!(!publisher.published(entry).await.unwrap());
    }

    #[tokio::test]
    async fn test_publish_all_rejects_unknown_name_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = PublishConfig {
            hub_base_url: server.uri(),
            ..memory_config()
        };
        let publisher = Publisher::new(config).unwrap();

        let names = vec!["bert-tiny".to_string(), "bert-huge".to_string()];
        let err = publisher.publish_all(&names).await.unwrap_err();
        assert!(matches!(err, PublishError::UnknownModel(name) if name == "bert-huge"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_published_false_on_empty_store() {
        let publisher = Publisher::new(memory_config()).unwrap();
        let entry = catalog::find("bert-base-uncased").unwrap();
        assert!(!publisher.published(entry).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_sha256_known_digest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("artifact");
        tokio::fs::write(&path, b"abc").await.unwrap();
        let digest = file_sha256(&path).await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_write_report_pretty_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");
        let report = PublishReport {
            version: "1".to_string(),
            store: "memory:".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![PublishOutcome {
                name: "bert-tiny".to_string(),
                repo: "google/bert_uncased_L-2_H-128_A-2".to_string(),
                object_key: "bert-tiny/v1/model.safetensors".to_string(),
                tensor_count: 37,
                bytes_fetched: 17_547_580,
                bytes_uploaded: 17_400_000,
                artifact_sha256: "0".repeat(64),
            }],
        };

        write_report(&path, &report).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], "1");
        assert_eq!(value["outcomes"][0]["name"], "bert-tiny");
        assert!(!path.with_extension("tmp").exists());
    }
}
