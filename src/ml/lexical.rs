//! Offline lexical embeddings
//!
//! Feature-hashed bag-of-words vectors. No model download, and the token
//! hash is FNV-1a so vectors are stable across builds and platforms. Good
//! enough to catch chunks that repeat the same
//! wording (running headers, duplicated pages, overlapping extractions).

use crate::error::{CorpusError, Result};
use crate::ml::embedding::{Embedding, SimilarityProvider, normalize_embedding};
use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the token's UTF-8 bytes
fn token_hash(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Hashed bag-of-words embedder
pub struct LexicalEmbedder {
    dimension: usize,
}

impl LexicalEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(CorpusError::Config(
                "Lexical embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimension];

        let folded: String = text.nfkc().collect::<String>().to_lowercase();
        for token in folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = token_hash(token);

            // Signed hashing keeps collisions from only ever adding similarity
            let index = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[index] += sign;
        }

        normalize_embedding(&mut embedding);
        embedding
    }
}

impl SimilarityProvider for LexicalEmbedder {
    fn name(&self) -> &str {
        "lexical"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.par_iter().map(|text| self.embed_one(text)).collect())
    }
}
