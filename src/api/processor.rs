//! CorpusProcessor - the document pipeline
//!
//! Runs extraction, cleaning, segmentation and deduplication for single
//! documents, and fans batches of documents out over a worker pool.

use crate::config::{Config, ProcessingConfig};
use crate::error::Result;
use crate::extract::{Document, ExtractionChain};
use crate::ml::{self, Deduplicator};
use crate::storage::{ChunkRecord, ChunkSink};
use crate::text::{Segmenter, TextNormalizer};
use crate::utils::collect_documents;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-document processing outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingResult {
    /// File name of the document
    pub filename: String,
    /// Extraction backend whose text was used
    pub backend_used: String,
    /// Whether the extracted text met the minimum length
    pub extraction_succeeded: bool,
    pub raw_text_length: usize,
    pub cleaned_text_length: usize,
    /// Chunks before deduplication
    pub initial_chunks_count: usize,
    /// Chunks after deduplication
    pub final_chunks_count: usize,
    /// Final chunks in document order
    pub chunks: Vec<String>,
    /// Where a sink persisted the chunks, if one did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// A document that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedDocument {
    pub file: String,
    pub error: String,
}

/// Batch counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchStats {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Aggregate outcome of a batch, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessingResult>,
    pub failed: Vec<FailedDocument>,
    pub stats: BatchStats,
    pub generated_at: DateTime<Utc>,
}

impl BatchReport {
    /// Build the report from outcomes tagged with their index into `paths`,
    /// whatever order they arrived in
    fn collect(
        paths: &[PathBuf],
        mut outcomes: Vec<(usize, std::result::Result<ProcessingResult, String>)>,
    ) -> Self {
        outcomes.sort_by_key(|(index, _)| *index);

        let mut processed = Vec::new();
        let mut failed = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(result) => processed.push(result),
                Err(error) => failed.push(FailedDocument {
                    file: paths[index].display().to_string(),
                    error,
                }),
            }
        }

        let stats = BatchStats {
            total_files: processed.len() + failed.len(),
            successful: processed.len(),
            failed: failed.len(),
        };

        Self {
            processed,
            failed,
            stats,
            generated_at: Utc::now(),
        }
    }

    /// Final chunks across all processed documents
    pub fn total_chunks(&self) -> usize {
        self.processed.iter().map(|r| r.final_chunks_count).sum()
    }
}

/// PDF-to-chunks pipeline
pub struct CorpusProcessor {
    config: ProcessingConfig,
    chain: ExtractionChain,
    normalizer: TextNormalizer,
    segmenter: Segmenter,
    deduplicator: Deduplicator,
}

impl CorpusProcessor {
    /// Assemble a processor from its collaborators
    pub fn new(
        config: ProcessingConfig,
        chain: ExtractionChain,
        deduplicator: Deduplicator,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            normalizer: TextNormalizer::new()?,
            segmenter: Segmenter::from_config(&config)?,
            config,
            chain,
            deduplicator,
        })
    }

    /// The standard pipeline: default extraction chain and the configured
    /// similarity provider
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let options = &config.processing_options;
        let chain = ExtractionChain::with_default_backends(options.min_text_length);
        log::info!(
            "Extraction backends: {}",
            chain
                .available_backends()
                .iter()
                .map(|kind| kind.to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let deduplicator = Deduplicator::new(ml::build_provider(&config.embedding));
        Self::new(options.clone(), chain, deduplicator)
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn chain(&self) -> &ExtractionChain {
        &self.chain
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.deduplicator
    }

    /// Run one document through extraction, cleaning, segmentation and
    /// deduplication
    pub fn process_document(&self, document: &Document) -> Result<ProcessingResult> {
        let extraction = self.chain.extract(document)?;
        let cleaned = self.normalizer.clean(&extraction.text);
        let chunks = self.segmenter.segment(&cleaned);
        let final_chunks = self
            .deduplicator
            .deduplicate(&chunks, self.config.dedup_threshold);

        log::info!(
            "{}: {} chunks, {} after deduplication ({})",
            document.filename(),
            chunks.len(),
            final_chunks.len(),
            extraction.backend_used
        );

        Ok(ProcessingResult {
            filename: document.filename(),
            backend_used: extraction.backend_used.to_string(),
            extraction_succeeded: extraction.succeeded,
            raw_text_length: extraction.text.chars().count(),
            cleaned_text_length: cleaned.chars().count(),
            initial_chunks_count: chunks.len(),
            final_chunks_count: final_chunks.len(),
            chunks: final_chunks,
            output_file: None,
        })
    }

    /// Read a document from disk and process it
    pub fn process_path<P: AsRef<Path>>(&self, path: P) -> Result<ProcessingResult> {
        let document = Document::open(path)?;
        self.process_document(&document)
    }

    /// Process documents independently; failures are recorded, never fatal
    pub fn process_batch(&self, paths: &[PathBuf]) -> BatchReport {
        self.process_batch_with(paths, None, |_, _| {})
    }

    /// Process documents, persisting each result through `sink` and
    /// reporting `(completed, total)` after every document.
    ///
    /// A failure to persist a document counts as that document's failure.
    pub fn process_batch_with<F>(
        &self,
        paths: &[PathBuf],
        sink: Option<&dyn ChunkSink>,
        progress: F,
    ) -> BatchReport
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let total = paths.len();
        let completed = AtomicUsize::new(0);

        let run = |(index, path): (usize, &PathBuf)| {
            let outcome = self.process_and_store(path, sink).map_err(|e| {
                log::error!("Failed to process {}: {}", path.display(), e);
                e.to_string()
            });
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(done, total);
            (index, outcome)
        };

        let outcomes: Vec<_> = match self.config.workers {
            1 => paths.iter().enumerate().map(run).collect(),
            0 => paths.par_iter().enumerate().map(run).collect(),
            workers => match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| paths.par_iter().enumerate().map(run).collect()),
                Err(e) => {
                    log::warn!("Failed to build a {}-thread pool, running sequentially: {}", workers, e);
                    paths.iter().enumerate().map(run).collect()
                }
            },
        };

        let report = BatchReport::collect(paths, outcomes);
        log::info!(
            "Batch finished: {} total, {} successful, {} failed",
            report.stats.total_files,
            report.stats.successful,
            report.stats.failed
        );
        report
    }

    /// Process every supported document under `input`, persist the results
    /// through `sink` and finish with the batch summary
    pub fn process_folder<P, F>(
        &self,
        input: P,
        sink: &dyn ChunkSink,
        progress: F,
    ) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        F: Fn(usize, usize) + Send + Sync,
    {
        let paths = collect_documents(input.as_ref(), &self.config.supported_formats)?;
        log::info!(
            "Processing {} documents from {}",
            paths.len(),
            input.as_ref().display()
        );

        let report = self.process_batch_with(&paths, Some(sink), progress);
        sink.write_summary(&report)?;
        Ok(report)
    }

    fn process_and_store(&self, path: &Path, sink: Option<&dyn ChunkSink>) -> Result<ProcessingResult> {
        let document = Document::open(path)?;
        let mut result = self.process_document(&document)?;

        if let Some(sink) = sink {
            let records =
                ChunkRecord::for_document(&document.stem(), &document.filename(), &result.chunks);
            let output = sink.write_document(&document, &records)?;
            result.output_file = Some(output.display().to_string());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaveFormat;
    use crate::error::CorpusError;
    use crate::extract::{BackendKind, ExtractionBackend};
    use crate::storage::{CorpusWriter, read_jsonl};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Treats the document bytes as UTF-8 text; bytes starting with
    /// `BROKEN` cannot be read
    struct PlainTextBackend;

    impl ExtractionBackend for PlainTextBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Custom("plain")
        }

        fn try_extract(&self, document: &Document) -> Result<String> {
            if document.bytes().starts_with(b"BROKEN") {
                return Err(CorpusError::Extraction("unreadable bytes".to_string()));
            }
            String::from_utf8(document.bytes().to_vec())
                .map_err(|e| CorpusError::Extraction(e.to_string()))
        }
    }

    struct FailingSink;

    impl ChunkSink for FailingSink {
        fn write_document(&self, _document: &Document, _records: &[ChunkRecord]) -> Result<PathBuf> {
            Err(CorpusError::Storage("disk full".to_string()))
        }

        fn write_summary(&self, _report: &BatchReport) -> Result<PathBuf> {
            Err(CorpusError::Storage("disk full".to_string()))
        }
    }

    fn processor(workers: usize) -> CorpusProcessor {
        let config = ProcessingConfig {
            min_text_length: 1,
            max_chunk_size: 60,
            overlap: 0,
            workers,
            ..Default::default()
        };
        let chain = ExtractionChain::new(vec![Box::new(PlainTextBackend)], config.min_text_length);
        CorpusProcessor::new(config, chain, Deduplicator::disabled()).unwrap()
    }

    fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ProcessingConfig {
            max_chunk_size: 0,
            ..Default::default()
        };
        let chain = ExtractionChain::new(vec![Box::new(PlainTextBackend)], 1);
        assert!(CorpusProcessor::new(config, chain, Deduplicator::disabled()).is_err());
    }

    #[test]
    fn test_process_document_counts() {
        let text = "First paragraph sentence. 12\n\nSecond paragraph here. Page 1 of 2";
        let document = Document::from_bytes("docs/sample.pdf", text.as_bytes().to_vec());

        let result = processor(1).process_document(&document).unwrap();
        assert_eq!(result.filename, "sample.pdf");
        assert_eq!(result.backend_used, "plain");
        assert!(result.extraction_succeeded);
        assert_eq!(result.raw_text_length, text.chars().count());
        assert_eq!(result.chunks, vec!["First paragraph sentence. Second paragraph here."]);
        assert_eq!(result.cleaned_text_length, result.chunks[0].chars().count());
        assert_eq!(result.initial_chunks_count, 1);
        assert_eq!(result.final_chunks_count, 1);
        assert!(result.output_file.is_none());
    }

    #[test]
    fn test_whitespace_document_yields_no_chunks() {
        let document = Document::from_bytes("blank.pdf", b"   \n\n  ".to_vec());
        let result = processor(1).process_document(&document).unwrap();
        assert!(!result.extraction_succeeded);
        assert!(result.chunks.is_empty());
        assert_eq!(result.final_chunks_count, 0);
    }

    #[test]
    fn test_batch_records_failures() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(
            temp_dir.path(),
            &[
                ("one.pdf", "The first document has text."),
                ("two.pdf", "BROKEN"),
                ("three.pdf", "The third document has text."),
            ],
        );

        let report = processor(1).process_batch(&paths);
        assert_eq!(
            report.stats,
            BatchStats {
                total_files: 3,
                successful: 2,
                failed: 1
            }
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, paths[1].display().to_string());
        assert!(report.failed[0].error.contains("unreadable bytes"));
        assert_eq!(report.processed[0].filename, "one.pdf");
        assert_eq!(report.processed[1].filename, "three.pdf");
    }

    #[test]
    fn test_missing_file_is_a_document_failure() {
        let temp_dir = TempDir::new().unwrap();
        let paths = vec![temp_dir.path().join("absent.pdf")];
        let report = processor(1).process_batch(&paths);
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.successful, 0);
    }

    #[test]
    fn test_parallel_batch_keeps_input_order() {
        let temp_dir = TempDir::new().unwrap();
        let files: Vec<(String, String)> = (0..24)
            .map(|i| (format!("doc{:02}.pdf", i), format!("Document number {} body text.", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
            .collect();
        let paths = write_files(temp_dir.path(), &borrowed);

        for workers in [0, 1, 4] {
            let report = processor(workers).process_batch(&paths);
            let names: Vec<&str> = report.processed.iter().map(|r| r.filename.as_str()).collect();
            let expected: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
            assert_eq!(names, expected, "order differs with {} workers", workers);
        }
    }

    #[test]
    fn test_progress_reports_every_document() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(
            temp_dir.path(),
            &[("a.pdf", "Alpha text."), ("b.pdf", "BROKEN"), ("c.pdf", "Gamma text.")],
        );

        let seen = Mutex::new(Vec::new());
        processor(0).process_batch_with(&paths, None, |done, total| {
            seen.lock().unwrap().push((done, total));
        });

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_sink_failure_counts_as_document_failure() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(temp_dir.path(), &[("a.pdf", "Alpha text.")]);

        let report = processor(1).process_batch_with(&paths, Some(&FailingSink), |_, _| {});
        assert_eq!(report.stats.successful, 0);
        assert_eq!(report.stats.failed, 1);
        assert!(report.failed[0].error.contains("disk full"));
    }

    #[test]
    fn test_process_folder_writes_outputs_and_summary() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_files(
            input.path(),
            &[
                ("report.pdf", "Quarterly results were strong."),
                ("notes.txt", "Not a pdf and not picked up."),
            ],
        );

        let writer = CorpusWriter::new(output.path(), SaveFormat::Jsonl).unwrap();
        let report = processor(1)
            .process_folder(input.path(), &writer, |_, _| {})
            .unwrap();

        assert_eq!(report.stats.total_files, 1);
        let jsonl = output.path().join("report_processed.jsonl");
        assert_eq!(report.processed[0].output_file, Some(jsonl.display().to_string()));

        let records = read_jsonl(&jsonl).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "report_chunk_0");
        assert_eq!(records[0].source_file, "report.pdf");

        let summary: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output.path().join("processing_stats.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["stats"]["successful"], 1);
        assert_eq!(summary["processed"][0]["filename"], "report.pdf");
    }

    #[test]
    fn test_process_folder_missing_input() {
        let output = TempDir::new().unwrap();
        let writer = CorpusWriter::new(output.path(), SaveFormat::Jsonl).unwrap();
        let result = processor(1).process_folder(output.path().join("nope"), &writer, |_, _| {});
        assert!(matches!(result, Err(CorpusError::Io(_))));
    }
}
