//! Text processing for pdfcorpus-rs
//!
//! This module cleans extracted text and segments it into bounded chunks.

pub mod chunking;
pub mod normalize;

// Re-export main types
pub use chunking::{Chunk, Segmenter};
pub use normalize::TextNormalizer;
