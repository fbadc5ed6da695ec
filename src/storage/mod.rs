//! Storage functionality for pdfcorpus-rs
//!
//! Chunk records and the sinks that persist them.

pub mod records;
pub mod writer;

// Re-export main types
pub use records::{ChunkRecord, read_jsonl};
pub use writer::{ChunkSink, CorpusWriter, SUMMARY_FILE};
