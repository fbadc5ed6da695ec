//! # pdfcorpus-rs
//!
//! Turns folders of PDF documents into bounded-size, cleaned and
//! deduplicated text chunks ready for retrieval or embedding pipelines.
//!
//! Each document goes through four stages:
//!
//! 1. a fallback chain of extraction backends (pdftotext, pdf-extract,
//!    lopdf, raw content streams), best first;
//! 2. text normalization that strips page numbers, page markers and
//!    copyright boilerplate;
//! 3. paragraph- and sentence-aware segmentation with character overlap;
//! 4. similarity-based removal of near-duplicate chunks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfcorpus_rs::{Config, CorpusProcessor, CorpusWriter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let processor = CorpusProcessor::from_config(&config)?;
//!     let writer = CorpusWriter::new("corpus", config.processing_options.save_format)?;
//!
//!     let report = processor.process_folder("pdfs", &writer, |done, total| {
//!         println!("{}/{}", done, total);
//!     })?;
//!
//!     println!(
//!         "{} documents processed, {} failed",
//!         report.stats.successful, report.stats.failed
//!     );
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod ml;
pub mod storage;
pub mod text;
pub mod utils;

// Re-export main API types
pub use api::{BatchReport, BatchStats, CorpusProcessor, FailedDocument, ProcessingResult};
pub use config::Config;
pub use error::{CorpusError, Result};

// Re-export commonly used types
pub use extract::{BackendKind, Document, ExtractionBackend, ExtractionChain, ExtractionResult};
pub use ml::{Deduplicator, SimilarityProvider};
pub use storage::{ChunkRecord, ChunkSink, CorpusWriter};
pub use text::{Chunk, Segmenter, TextNormalizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_imports() {
        // Ensure all major types can be imported
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(TextNormalizer::new().is_ok());
        assert!(Segmenter::from_config(&config.processing_options).is_ok());
    }
}
