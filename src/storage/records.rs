//! The persisted unit of output

use crate::error::{CorpusError, Result};
use crate::text::Chunk;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One chunk as written to a JSONL corpus file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    /// `{stem}_chunk_{index}`
    pub id: String,
    /// File name of the source document
    pub source_file: String,
    pub content: String,
    pub chunk_index: usize,
}

impl ChunkRecord {
    pub fn from_chunk(stem: &str, source_file: &str, chunk: &Chunk) -> Self {
        Self {
            id: format!("{}_chunk_{}", stem, chunk.index),
            source_file: source_file.to_string(),
            content: chunk.content.clone(),
            chunk_index: chunk.index,
        }
    }

    /// Records for a document's final chunks, indexed densely from zero
    pub fn for_document(stem: &str, source_file: &str, chunks: &[String]) -> Vec<Self> {
        Chunk::sequence(chunks.to_vec())
            .iter()
            .map(|chunk| Self::from_chunk(stem, source_file, chunk))
            .collect()
    }
}

/// Read a JSONL corpus file back into records; blank lines are ignored
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<ChunkRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            CorpusError::Storage(format!(
                "{}:{}: invalid chunk record: {}",
                path.display(),
                line_number + 1,
                e
            ))
        })?;
        records.push(record);
    }

    Ok(records)
}
