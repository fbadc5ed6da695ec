//! Similarity-based removal of near-duplicate chunks

use crate::ml::embedding::{Embedding, SimilarityProvider, cosine_similarity};
use std::sync::Arc;

/// Greedy near-duplicate filter over a document's chunks.
///
/// Holds an optional similarity provider. Without one (not configured, or
/// unavailable when the deduplicator was built) deduplication is the
/// identity.
#[derive(Clone)]
pub struct Deduplicator {
    provider: Option<Arc<dyn SimilarityProvider>>,
}

impl Deduplicator {
    /// Create a deduplicator; an unavailable provider is dropped here, once
    pub fn new(provider: Option<Arc<dyn SimilarityProvider>>) -> Self {
        let provider = provider.filter(|provider| {
            let available = provider.is_available();
            if !available {
                log::warn!(
                    "Similarity provider {} unavailable, deduplication disabled",
                    provider.name()
                );
            }
            available
        });

        Self { provider }
    }

    /// A deduplicator that keeps every chunk
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|provider| provider.name())
    }

    /// Drop every chunk whose cosine similarity to an already retained chunk
    /// is strictly greater than `threshold`. Order is preserved.
    ///
    /// Provider failures are logged and leave the chunks untouched.
    pub fn deduplicate(&self, chunks: &[String], threshold: f32) -> Vec<String> {
        if chunks.len() < 2 {
            return chunks.to_vec();
        }
        let Some(provider) = self.provider.as_deref() else {
            return chunks.to_vec();
        };

        let embeddings = match provider.embed(chunks) {
            Ok(embeddings) if embeddings.len() == chunks.len() => embeddings,
            Ok(embeddings) => {
                log::warn!(
                    "{} returned {} embeddings for {} chunks, skipping deduplication",
                    provider.name(),
                    embeddings.len(),
                    chunks.len()
                );
                return chunks.to_vec();
            }
            Err(e) => {
                log::warn!(
                    "Embedding with {} failed, skipping deduplication: {}",
                    provider.name(),
                    e
                );
                return chunks.to_vec();
            }
        };

        let retained = retain_distinct(&embeddings, threshold);
        log::debug!(
            "Deduplication kept {} of {} chunks (threshold {})",
            retained.len(),
            chunks.len(),
            threshold
        );

        retained.into_iter().map(|i| chunks[i].clone()).collect()
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Indices of the vectors kept by one greedy pass in input order
pub fn retain_distinct(embeddings: &[Embedding], threshold: f32) -> Vec<usize> {
    let mut retained: Vec<usize> = Vec::new();

    for (i, candidate) in embeddings.iter().enumerate() {
        let duplicate = retained
            .iter()
            .any(|&kept| cosine_similarity(candidate, &embeddings[kept]) > threshold);
        if !duplicate {
            retained.push(i);
        }
    }

    retained
}
