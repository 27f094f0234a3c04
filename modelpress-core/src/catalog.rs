//! Static checkpoint catalog.
//!
//! The published BERT family: the four classic checkpoints plus the 24
//! compact models from the pretrained miniatures release, four of which go
//! by their familiar nicknames (tiny, mini, small, medium). Names are the
//! publish names used in object keys; repositories are HuggingFace Hub ids.

use serde::Serialize;

/// Weights file fetched from the hub for every catalog entry.
pub const SOURCE_WEIGHTS_FILE: &str = "pytorch_model.bin";

/// File name of the published artifact within its versioned key.
pub const ARTIFACT_FILE: &str = "model.safetensors";

/// One publishable checkpoint: publish name plus hub repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Name the checkpoint is published under.
    pub name: &'static str,
    /// HuggingFace Hub repository id.
    pub repo: &'static str,
}

/// Every checkpoint the tool publishes, in publish order.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { name: "bert-base-uncased", repo: "bert-base-uncased" },
    CatalogEntry { name: "bert-base-cased", repo: "bert-base-cased" },
    CatalogEntry { name: "bert-large-uncased", repo: "bert-large-uncased" },
    CatalogEntry { name: "bert-large-cased", repo: "bert-large-cased" },
    CatalogEntry { name: "bert-tiny", repo: "google/bert_uncased_L-2_H-128_A-2" },
    CatalogEntry { name: "bert-mini", repo: "google/bert_uncased_L-4_H-256_A-4" },
    CatalogEntry { name: "bert-small", repo: "google/bert_uncased_L-4_H-512_A-8" },
    CatalogEntry { name: "bert-medium", repo: "google/bert_uncased_L-8_H-512_A-8" },
    CatalogEntry { name: "bert-L4H128", repo: "google/bert_uncased_L-4_H-128_A-2" },
    CatalogEntry { name: "bert-L6H128", repo: "google/bert_uncased_L-6_H-128_A-2" },
    CatalogEntry { name: "bert-L8H128", repo: "google/bert_uncased_L-8_H-128_A-2" },
    CatalogEntry { name: "bert-L10H128", repo: "google/bert_uncased_L-10_H-128_A-2" },
    CatalogEntry { name: "bert-L12H128", repo: "google/bert_uncased_L-12_H-128_A-2" },
    CatalogEntry { name: "bert-L2H256", repo: "google/bert_uncased_L-2_H-256_A-4" },
    CatalogEntry { name: "bert-L6H256", repo: "google/bert_uncased_L-6_H-256_A-4" },
    CatalogEntry { name: "bert-L8H256", repo: "google/bert_uncased_L-8_H-256_A-4" },
    CatalogEntry { name: "bert-L10H256", repo: "google/bert_uncased_L-10_H-256_A-4" },
    CatalogEntry { name: "bert-L12H256", repo: "google/bert_uncased_L-12_H-256_A-4" },
    CatalogEntry { name: "bert-L2H512", repo: "google/bert_uncased_L-2_H-512_A-8" },
    CatalogEntry { name: "bert-L6H512", repo: "google/bert_uncased_L-6_H-512_A-8" },
    CatalogEntry { name: "bert-L10H512", repo: "google/bert_uncased_L-10_H-512_A-8" },
    CatalogEntry { name: "bert-L12H512", repo: "google/bert_uncased_L-12_H-512_A-8" },
    CatalogEntry { name: "bert-L2H768", repo: "google/bert_uncased_L-2_H-768_A-12" },
    CatalogEntry { name: "bert-L4H768", repo: "google/bert_uncased_L-4_H-768_A-12" },
    CatalogEntry { name: "bert-L6H768", repo: "google/bert_uncased_L-6_H-768_A-12" },
    CatalogEntry { name: "bert-L8H768", repo: "google/bert_uncased_L-8_H-768_A-12" },
    CatalogEntry { name: "bert-L10H768", repo: "google/bert_uncased_L-10_H-768_A-12" },
    CatalogEntry { name: "bert-L12H768", repo: "google/bert_uncased_L-12_H-768_A-12" },
];

/// Look up a catalog entry by publish name.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}

impl CatalogEntry {
    /// Hub URL the weights file is fetched from.
    pub fn weights_url(&self, hub_base: &str) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            hub_base.trim_end_matches('/'),
            self.repo,
            SOURCE_WEIGHTS_FILE
        )
    }

    /// Object key the converted artifact is published under.
    pub fn object_key(&self, version: &str) -> String {
        format!("{}/v{}/{}", self.name, version, ARTIFACT_FILE)
    }
}
