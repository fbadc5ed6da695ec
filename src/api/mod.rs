//! API layer for pdfcorpus-rs
//!
//! This module provides the document pipeline and its batch reports.

pub mod processor;

// Re-export main API types
pub use processor::{BatchReport, BatchStats, CorpusProcessor, FailedDocument, ProcessingResult};
