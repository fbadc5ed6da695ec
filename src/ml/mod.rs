//! Machine learning module for pdfcorpus-rs
//!
//! Embedding providers and the similarity-based deduplicator built on them.
//! The BERT provider runs on candle; the lexical provider needs no model.

pub mod bert;
pub mod dedup;
pub mod device;
pub mod embedding;
pub mod lexical;

// Re-export main types and functions
pub use bert::SentenceEmbedder;
pub use dedup::Deduplicator;
pub use device::DeviceType;
pub use embedding::{Embedding, SimilarityProvider, cosine_similarity};
pub use lexical::LexicalEmbedder;

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use std::sync::Arc;

/// Build the configured similarity provider.
///
/// A provider that fails to load is reported and left out, which turns
/// deduplication into a no-op rather than failing the run.
pub fn build_provider(config: &EmbeddingConfig) -> Option<Arc<dyn SimilarityProvider>> {
    match config.provider {
        EmbeddingProvider::Bert => match SentenceEmbedder::load(config) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                log::warn!(
                    "Failed to load embedding model {}, deduplication disabled: {}",
                    config.model_name,
                    e
                );
                None
            }
        },
        EmbeddingProvider::Lexical => match LexicalEmbedder::new(config.dimension) {
            Ok(embedder) => Some(Arc::new(embedder)),
            Err(e) => {
                log::warn!("Lexical embedder unavailable, deduplication disabled: {}", e);
                None
            }
        },
        EmbeddingProvider::None => None,
    }
}
