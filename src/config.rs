//! Configuration for pdfcorpus-rs
//!
//! Values are plain serde structs. A JSON configuration file only needs the
//! keys it overrides; everything else falls back to the defaults below.

use crate::error::{CorpusError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Pipeline tuning knobs
    pub processing_options: ProcessingConfig,

    /// Similarity provider used for deduplication
    pub embedding: EmbeddingConfig,
}

/// Output format for per-document chunk files
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// One JSON record per line
    #[default]
    Jsonl,
    /// `<CHUNK_i>` tagged plain text
    Txt,
}

/// Processing configuration consumed by the core pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Minimum stripped text length for an extraction to be accepted
    pub min_text_length: usize,

    /// Maximum chunk size in characters (before overlap)
    pub max_chunk_size: usize,

    /// Characters carried over from the previous chunk
    pub overlap: usize,

    /// Cosine similarity above which a chunk counts as a near-duplicate
    #[serde(rename = "deduplication_threshold", alias = "dedup_threshold")]
    pub dedup_threshold: f32,

    /// File extensions picked up when walking an input folder
    pub supported_formats: Vec<String>,

    /// Per-document output format
    pub save_format: SaveFormat,

    /// Worker threads for batch processing (0 = all cores, 1 = sequential)
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_chunk_size: 1000,
            overlap: 100,
            dedup_threshold: 0.9,
            supported_formats: vec![".pdf".to_string()],
            save_format: SaveFormat::Jsonl,
            workers: 0,
        }
    }
}

/// Which similarity provider backs deduplication
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Sentence-transformer BERT model run with candle
    #[default]
    Bert,
    /// Offline hashed bag-of-words vectors
    Lexical,
    /// Deduplication disabled
    None,
}

/// Configuration for the embedding model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider selection
    pub provider: EmbeddingProvider,
    /// HuggingFace model identifier
    pub model_name: String,
    /// Model revision on the hub
    pub revision: String,
    /// Maximum sequence length in tokens
    pub max_length: usize,
    /// Batch size for inference
    pub batch_size: usize,
    /// Vector dimension for the lexical provider
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Bert,
            model_name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            revision: "main".to_string(),
            max_length: 256,
            batch_size: 32,
            dimension: 384,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, merged over the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            CorpusError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check the values the pipeline relies on before any document is touched
    pub fn validate(&self) -> Result<()> {
        self.processing_options.validate()
    }
}

impl ProcessingConfig {
    /// Reject values that would violate pipeline preconditions
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(CorpusError::Segmentation(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.dedup_threshold) {
            return Err(CorpusError::Config(format!(
                "deduplication_threshold must be within [-1, 1], got {}",
                self.dedup_threshold
            )));
        }

        if self.supported_formats.is_empty() {
            return Err(CorpusError::Config(
                "supported_formats must list at least one extension".to_string(),
            ));
        }

        Ok(())
    }
}
