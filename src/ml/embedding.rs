//! Similarity providers for near-duplicate detection
//!
//! Deduplication treats the embedding model as an opaque oracle: anything
//! that turns a batch of texts into vectors can back it.

use crate::error::Result;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Source of embeddings for a batch of texts.
///
/// `embed` must return one vector per input text, in input order.
pub trait SimilarityProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether the provider can serve requests
    fn is_available(&self) -> bool {
        true
    }

    /// Embed every text in `texts`
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Scale a vector to unit length in place; zero vectors are left alone
pub fn normalize_embedding(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for val in embedding.iter_mut() {
            *val /= norm;
        }
    }
}
