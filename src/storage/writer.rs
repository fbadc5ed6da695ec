//! Persisting processed documents to an output folder

use crate::api::BatchReport;
use crate::config::SaveFormat;
use crate::error::Result;
use crate::extract::Document;
use crate::storage::records::ChunkRecord;
use crate::utils::{ensure_directory, sanitize_filename};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Name of the batch summary written next to the chunk files
pub const SUMMARY_FILE: &str = "processing_stats.json";

/// Destination for processed chunks and the batch summary
pub trait ChunkSink: Send + Sync {
    /// Persist one document's records, returning where they went
    fn write_document(&self, document: &Document, records: &[ChunkRecord]) -> Result<PathBuf>;

    /// Persist the batch summary
    fn write_summary(&self, report: &BatchReport) -> Result<PathBuf>;
}

/// Writes `{stem}_processed.jsonl` or `{stem}_processed.txt` per document and
/// `processing_stats.json` per batch into one folder
pub struct CorpusWriter {
    output_dir: PathBuf,
    format: SaveFormat,
}

impl CorpusWriter {
    /// Create a writer, creating the output folder if needed
    pub fn new<P: AsRef<Path>>(output_dir: P, format: SaveFormat) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        ensure_directory(&output_dir)?;
        Ok(Self { output_dir, format })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// Output path for a document stem in this writer's format
    pub fn document_path(&self, stem: &str) -> PathBuf {
        let extension = match self.format {
            SaveFormat::Jsonl => "jsonl",
            SaveFormat::Txt => "txt",
        };
        self.output_dir
            .join(format!("{}_processed.{}", sanitize_filename(stem), extension))
    }
}

impl ChunkSink for CorpusWriter {
    fn write_document(&self, document: &Document, records: &[ChunkRecord]) -> Result<PathBuf> {
        let path = self.document_path(&document.stem());

        // Rendered in full first so the file is written with a single call
        let mut rendered = String::new();
        match self.format {
            SaveFormat::Jsonl => {
                for record in records {
                    rendered.push_str(&serde_json::to_string(record)?);
                    rendered.push('\n');
                }
            }
            SaveFormat::Txt => {
                for record in records {
                    let _ = write!(
                        rendered,
                        "<CHUNK_{i}>\n{}\n</CHUNK_{i}>\n\n",
                        record.content,
                        i = record.chunk_index
                    );
                }
            }
        }

        std::fs::write(&path, rendered)?;
        log::debug!("Wrote {} chunks to {}", records.len(), path.display());
        Ok(path)
    }

    fn write_summary(&self, report: &BatchReport) -> Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        log::info!("Processing summary written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::read_jsonl;
    use tempfile::TempDir;

    fn records() -> Vec<ChunkRecord> {
        ChunkRecord::for_document(
            "paper",
            "paper.pdf",
            &["First chunk.".to_string(), "Second chunk, naïve café.".to_string()],
        )
    }

    #[test]
    fn test_creates_output_folder() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out/nested");
        let writer = CorpusWriter::new(&target, SaveFormat::Jsonl).unwrap();
        assert!(target.is_dir());
        assert_eq!(writer.output_dir(), target.as_path());
    }

    #[test]
    fn test_jsonl_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let writer = CorpusWriter::new(temp_dir.path(), SaveFormat::Jsonl).unwrap();
        let document = Document::from_bytes("papers/paper.pdf", Vec::new());

        let path = writer.write_document(&document, &records()).unwrap();
        assert_eq!(path, temp_dir.path().join("paper_processed.jsonl"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("naïve café"));
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(read_jsonl(&path).unwrap(), records());
    }

    #[test]
    fn test_tagged_text_format() {
        let temp_dir = TempDir::new().unwrap();
        let writer = CorpusWriter::new(temp_dir.path(), SaveFormat::Txt).unwrap();
        let document = Document::from_bytes("paper.pdf", Vec::new());

        let path = writer.write_document(&document, &records()).unwrap();
        assert_eq!(path, temp_dir.path().join("paper_processed.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<CHUNK_0>\nFirst chunk.\n</CHUNK_0>\n\n<CHUNK_1>\nSecond chunk, naïve café.\n</CHUNK_1>\n\n"
        );
    }

    #[test]
    fn test_empty_document_writes_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = CorpusWriter::new(temp_dir.path(), SaveFormat::Jsonl).unwrap();
        let document = Document::from_bytes("blank.pdf", Vec::new());

        let path = writer.write_document(&document, &[]).unwrap();
        assert!(read_jsonl(&path).unwrap().is_empty());
    }
}
