//! # modelpress-core
//!
//! Library behind the `modelpress` binary. Publishes the BERT checkpoint
//! family by downloading `pytorch_model.bin` files from the HuggingFace Hub,
//! re-serializing them into safetensors, and uploading the result to object
//! storage under versioned keys (`{name}/v{version}/model.safetensors`).
//!
//! The pipeline is deliberately simple: one model at a time, three steps per
//! model, fail-fast on the first error. There is no concurrency, no retry
//! logic, and no download cache.

pub mod catalog;
pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod publish;
pub mod store;

pub use catalog::{CatalogEntry, CATALOG};
pub use config::{load_config, PublishConfig};
pub use convert::{convert_checkpoint, ConversionReport};
pub use download::{Downloader, FetchSummary};
pub use error::{PublishError, Result};
pub use publish::{PublishOutcome, PublishReport, Publisher};
pub use store::{ArtifactStore, StoreLocation};
