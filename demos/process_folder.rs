//! Folder processing example for pdfcorpus-rs
//!
//! This example shows how to:
//! 1. Build a configuration in code
//! 2. Process a single PDF and inspect the result
//! 3. Process a whole folder into JSONL chunk files
//!
//! Usage: `cargo run --example process_folder -- <pdf-folder> [output-folder]`

use pdfcorpus_rs::config::{EmbeddingProvider, SaveFormat};
use pdfcorpus_rs::utils::collect_documents;
use pdfcorpus_rs::{Config, CorpusProcessor, CorpusWriter};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    println!("📚 pdfcorpus-rs Folder Processing Example");
    println!("=========================================");

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| "pdfs".to_string()));
    let output = PathBuf::from(args.next().unwrap_or_else(|| "corpus".to_string()));

    // Tighter chunks than the defaults, and offline deduplication
    let mut config = Config::default();
    config.processing_options.min_text_length = 100;
    config.processing_options.max_chunk_size = 2000;
    config.processing_options.overlap = 200;
    config.processing_options.dedup_threshold = 0.85;
    config.processing_options.save_format = SaveFormat::Jsonl;
    config.embedding.provider = EmbeddingProvider::Lexical;

    let processor = CorpusProcessor::from_config(&config)?;
    println!("⚙️  Processor configured:");
    println!("   - Min text length: {}", config.processing_options.min_text_length);
    println!("   - Max chunk size: {}", config.processing_options.max_chunk_size);
    println!("   - Overlap: {}", config.processing_options.overlap);
    println!("   - Dedup threshold: {}", config.processing_options.dedup_threshold);

    // Single document first
    let documents = collect_documents(&input, &config.processing_options.supported_formats)?;
    let Some(first) = documents.first() else {
        println!("⚠️  No PDFs found in {}", input.display());
        return Ok(());
    };

    println!("\n📄 Processing a single document...");
    let result = processor.process_path(first)?;
    println!("   File: {}", result.filename);
    println!("   Backend: {}", result.backend_used);
    println!("   Raw text length: {}", result.raw_text_length);
    println!("   Cleaned text length: {}", result.cleaned_text_length);
    println!("   Initial chunks: {}", result.initial_chunks_count);
    println!("   Chunks after dedup: {}", result.final_chunks_count);
    for (i, chunk) in result.chunks.iter().take(3).enumerate() {
        let preview: String = chunk.chars().take(100).collect();
        println!("   Chunk {}: {}...", i + 1, preview);
    }

    // Then the whole folder
    println!("\n📁 Processing {} documents...", documents.len());
    let writer = CorpusWriter::new(&output, config.processing_options.save_format)?;
    let report = processor.process_folder(&input, &writer, |done, total| {
        println!("   {}/{}", done, total);
    })?;

    println!("\n✅ Done!");
    println!("   Successful: {}", report.stats.successful);
    println!("   Failed: {}", report.stats.failed);
    println!("   Chunks written: {}", report.total_chunks());
    println!("   Output: {}", output.display());

    Ok(())
}
