//! Artifact upload to object storage.
//!
//! Destinations are addressed by URL: `gs://bucket/prefix`, `s3://bucket`,
//! `file:///path`, or `memory:` for tests. Backend clients come from the
//! `object_store` crate; cloud credentials are read from the environment the
//! same way the native SDKs read them.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use tracing::{debug, info};

use crate::error::{PublishError, Result};

/// Parsed destination URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    /// URL scheme (`gs`, `s3`, `file`, `memory`).
    pub scheme: String,
    /// Bucket name (`None` for `file://` and `memory:`).
    pub bucket: Option<String>,
    /// Key prefix inside the bucket, without surrounding slashes.
    pub prefix: String,
}

impl StoreLocation {
    /// Parse a destination URL like `gs://bucket/prefix` or `file:///path`.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = url::Url::parse(raw)
            .map_err(|e| PublishError::store(format!("invalid store URL '{}': {}", raw, e)))?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            bucket: url.host_str().map(|s| s.to_string()),
            prefix: url.path().trim_matches('/').to_string(),
        })
    }

    fn bucket(&self) -> Result<&str> {
        self.bucket.as_deref().filter(|b| !b.is_empty()).ok_or_else(|| {
            PublishError::store(format!(
                "{}:// URL must include a bucket name",
                self.scheme
            ))
        })
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.bucket, self.prefix.is_empty()) {
            (Some(bucket), true) => write!(f, "{}://{}", self.scheme, bucket),
            (Some(bucket), false) => write!(f, "{}://{}/{}", self.scheme, bucket, self.prefix),
            (None, true) => write!(f, "{}:", self.scheme),
            (None, false) => write!(f, "{}:///{}", self.scheme, self.prefix),
        }
    }
}

/// Artifact store over any `object_store` backend.
#[derive(Debug)]
pub struct ArtifactStore {
    inner: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ArtifactStore {
    /// Open the backend described by `location`.
    ///
    /// `gs` and `s3` read credentials from the environment. `file` roots are
    /// created if missing; their path becomes the store root, so keys are
    /// laid out directly beneath it.
    pub fn open(location: &StoreLocation) -> Result<Self> {
        let mut prefix = location.prefix.clone();
        let inner: Arc<dyn ObjectStore> = match location.scheme.as_str() {
            "memory" => Arc::new(object_store::memory::InMemory::new()),
            "file" => {
                let root = match &location.bucket {
                    Some(host) if !host.is_empty() => format!("/{}/{}", host, location.prefix),
                    _ => format!("/{}", location.prefix),
                };
                std::fs::create_dir_all(&root)?;
                prefix = String::new();
                Arc::new(object_store::local::LocalFileSystem::new_with_prefix(&root)?)
            }
            "s3" => Arc::new(
                object_store::aws::AmazonS3Builder::from_env()
                    .with_bucket_name(location.bucket()?)
                    .build()?,
            ),
            "gs" => Arc::new(
                object_store::gcp::GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(location.bucket()?)
                    .build()?,
            ),
            scheme => {
                return Err(PublishError::store(format!(
                    "unsupported store scheme: {}",
                    scheme
                )));
            }
        };

        Ok(Self { inner, prefix })
    }

    /// In-memory store for tests.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(object_store::memory::InMemory::new()),
            prefix: String::new(),
        }
    }

    /// In-memory store with a key prefix, for tests.
    pub fn memory_with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(object_store::memory::InMemory::new()),
            prefix: prefix.into(),
        }
    }

    fn object_path(&self, key: &str) -> ObjectPath {
        let key = key.trim_start_matches('/');
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{}", self.prefix, key))
        }
    }

    /// Upload a local file to `key`. Overwrites any existing object.
    pub async fn put_file(&self, key: &str, local: &FsPath) -> Result<u64> {
        let data = tokio::fs::read(local).await?;
        let len = data.len() as u64;
        let path = self.object_path(key);
        debug!(key = %path, bytes = len, "uploading artifact");
        self.inner.put(&path, PutPayload::from(data)).await?;
        info!(key = %path, bytes = len, "uploaded artifact");
        Ok(len)
    }

    /// Whether an object exists at `key`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.inner.head(&self.object_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the object at `key`.
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let result = self.inner.get(&self.object_path(key)).await?;
        Ok(result.bytes().await?)
    }
}
