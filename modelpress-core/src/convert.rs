//! Checkpoint container conversion.
//!
//! Reads a PyTorch pickle checkpoint and re-serializes its tensors into the
//! safetensors container. Tensor names, shapes, and dtypes pass through
//! unchanged; only the container format changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{pickle, safetensors, Tensor};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PublishError, Result};

/// Outcome of one container conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub tensor_count: usize,
    pub source_size_bytes: u64,
    pub output_size_bytes: u64,
}

/// Convert a PyTorch checkpoint at `source` into a safetensors file at `output`.
///
/// Blocking; callers on the async runtime should wrap this in
/// `tokio::task::spawn_blocking`. Sources that are not zip-based PyTorch
/// checkpoints (legacy pre-1.6 streams, truncated downloads) fail with a
/// conversion error naming the path.
pub fn convert_checkpoint(source: &Path, output: &Path) -> Result<ConversionReport> {
    let source_size_bytes = std::fs::metadata(source)?.len();
    debug!(source = %source.display(), "reading checkpoint");

    let tensors = pickle::read_all(source).map_err(|e| {
        PublishError::convert(format!(
            "failed to read checkpoint {}: {}",
            source.display(),
            e
        ))
    })?;
    let map = tensor_map(tensors, source)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    safetensors::save(&map, output)?;
    let output_size_bytes = std::fs::metadata(output)?.len();

    info!(
        source = %source.display(),
        output = %output.display(),
        tensors = map.len(),
        "converted checkpoint"
    );

    Ok(ConversionReport {
        source_path: source.to_path_buf(),
        output_path: output.to_path_buf(),
        tensor_count: map.len(),
        source_size_bytes,
        output_size_bytes,
    })
}

/// Collect named tensors into a map, rejecting empty and duplicate-keyed
/// checkpoints. safetensors requires unique tensor names.
fn tensor_map(tensors: Vec<(String, Tensor)>, source: &Path) -> Result<HashMap<String, Tensor>> {
    if tensors.is_empty() {
        return Err(PublishError::convert(format!(
            "checkpoint {} contains no tensors",
            source.display()
        )));
    }

    let mut map = HashMap::with_capacity(tensors.len());
    for (name, tensor) in tensors {
        if map.insert(name.clone(), tensor).is_some() {
            return Err(PublishError::convert(format!(
                "duplicate tensor name '{}' in {}",
                name,
                source.display()
            )));
        }
    }
    Ok(map)
}
