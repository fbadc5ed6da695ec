//! pdfcorpus CLI application
//!
//! Command-line interface for the pdfcorpus-rs library.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdfcorpus_rs::config::{EmbeddingProvider, SaveFormat};
use pdfcorpus_rs::utils::format_file_size;
use pdfcorpus_rs::{Config, CorpusProcessor, CorpusWriter, Document, ExtractionChain, TextNormalizer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdfcorpus")]
#[command(about = "Turn folders of PDFs into clean, deduplicated text chunks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in a folder into chunk files
    Process {
        /// Folder containing the input documents
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for the processed output
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters of overlap between chunks
        #[arg(long)]
        overlap: Option<usize>,

        /// Similarity threshold for deduplication
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<f32>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Similarity provider used for deduplication
        #[arg(long, value_enum)]
        embedder: Option<EmbedderArg>,

        /// Worker threads (0 = all cores, 1 = sequential)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Extract and clean the text of a single document
    Extract {
        /// Document to extract
        file: PathBuf,

        /// Minimum text length for an extraction to be accepted
        #[arg(long, default_value = "50")]
        min_text_length: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Jsonl,
    Txt,
}

impl From<FormatArg> for SaveFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Jsonl => SaveFormat::Jsonl,
            FormatArg::Txt => SaveFormat::Txt,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmbedderArg {
    Bert,
    Lexical,
    None,
}

impl From<EmbedderArg> for EmbeddingProvider {
    fn from(embedder: EmbedderArg) -> Self {
        match embedder {
            EmbedderArg::Bert => EmbeddingProvider::Bert,
            EmbedderArg::Lexical => EmbeddingProvider::Lexical,
            EmbedderArg::None => EmbeddingProvider::None,
        }
    }
}

/// Values given on the command line, applied over the configuration file
#[derive(Default)]
struct Overrides {
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    threshold: Option<f32>,
    format: Option<FormatArg>,
    embedder: Option<EmbedderArg>,
    workers: Option<usize>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        let options = &mut config.processing_options;
        if let Some(chunk_size) = self.chunk_size {
            options.max_chunk_size = chunk_size;
        }
        if let Some(overlap) = self.overlap {
            options.overlap = overlap;
        }
        if let Some(threshold) = self.threshold {
            options.dedup_threshold = threshold;
        }
        if let Some(format) = self.format {
            options.save_format = format.into();
        }
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(embedder) = self.embedder {
            config.embedding.provider = embedder.into();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            chunk_size,
            overlap,
            threshold,
            format,
            embedder,
            workers,
        } => {
            let overrides = Overrides {
                chunk_size,
                overlap,
                threshold,
                format,
                embedder,
                workers,
            };
            process_command(input, output, config, overrides)?;
        }
        Commands::Extract {
            file,
            min_text_length,
        } => {
            extract_command(file, min_text_length)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) if path.exists() => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        Some(path) => {
            eprintln!(
                "⚠️  Config file not found, using defaults: {}",
                path.display()
            );
            Ok(Config::default())
        }
        None => Ok(Config::default()),
    }
}

fn process_command(
    input: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path.as_deref())?;
    overrides.apply(&mut config);

    if !input.exists() {
        eprintln!("❌ Input path does not exist: {}", input.display());
        std::process::exit(1);
    }

    config.validate()?;
    let options = &config.processing_options;

    println!(
        "📚 Processing PDFs from {} into {}",
        input.display(),
        output.display()
    );
    println!(
        "   ⚙️  Chunk size: {}, overlap: {}, dedup threshold: {}",
        options.max_chunk_size, options.overlap, options.dedup_threshold
    );

    let processor = CorpusProcessor::from_config(&config)?;
    match processor.deduplicator().provider_name() {
        Some(name) => println!("   🧠 Deduplicating with {}", name),
        None => println!("   🧠 Deduplication disabled"),
    }

    let writer = CorpusWriter::new(&output, options.save_format)?;

    let progress = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("=>-"));
    }
    progress.set_message("processing");

    let report = processor.process_folder(&input, &writer, |done, total| {
        progress.set_length(total as u64);
        progress.set_position(done as u64);
    })?;
    progress.finish_and_clear();

    println!("✅ Processing complete!");
    println!("   📄 Total files: {}", report.stats.total_files);
    println!("   ✔️  Successful: {}", report.stats.successful);
    println!("   ❌ Failed: {}", report.stats.failed);
    println!("   🧩 Chunks written: {}", report.total_chunks());
    println!("   📁 Output: {}", writer.output_dir().display());

    if !report.failed.is_empty() {
        println!();
        println!("Failed files:");
        for failed in &report.failed {
            println!("  - {}: {}", failed.file, failed.error);
        }
    }

    Ok(())
}

fn extract_command(file: PathBuf, min_text_length: usize) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open(&file)?;
    println!(
        "📄 {} ({})",
        document.filename(),
        format_file_size(document.bytes().len() as u64)
    );

    let chain = ExtractionChain::with_default_backends(min_text_length);
    let extraction = chain.extract(&document)?;
    let cleaned = TextNormalizer::new()?.clean(&extraction.text);

    let status = if extraction.succeeded { "✅" } else { "⚠️ " };
    println!("   {} Backend: {}", status, extraction.backend_used);
    println!("   📏 Raw length: {}", extraction.text.chars().count());
    println!("   🧹 Cleaned length: {}", cleaned.chars().count());
    println!();
    println!("{}", cleaned);

    Ok(())
}
