//! Size-bounded segmentation of normalized text
//!
//! Paragraphs are packed greedily into chunks of at most `max_chunk_size`
//! characters. Oversized paragraphs fall back to sentence packing, and
//! oversized sentences are cut into fixed-size slices. A final pass carries
//! the tail of each chunk into the next one for cross-boundary context.

use crate::config::ProcessingConfig;
use crate::error::{CorpusError, Result};
use crate::text::normalize::SENTENCE_TERMINATORS;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A chunk of a single document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The actual text content
    pub content: String,

    /// Position within the document's chunk list, starting at 0
    pub index: usize,

    /// Length of the content in characters
    pub length: usize,
}

impl Chunk {
    /// Create a chunk, computing its character length
    pub fn new(index: usize, content: String) -> Self {
        let length = content.chars().count();
        Self {
            content,
            index,
            length,
        }
    }

    /// Index a document-ordered list of chunk texts
    pub fn sequence(contents: Vec<String>) -> Vec<Chunk> {
        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk::new(index, content))
            .collect()
    }
}

/// Greedy packing buffer. Units are joined with a single space and the
/// buffer never grows past `limit` characters.
struct Accumulator {
    buffer: String,
    length: usize,
    limit: usize,
}

impl Accumulator {
    fn new(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            length: 0,
            limit,
        }
    }

    /// Append `unit` if the result still fits; report whether it did
    fn try_push(&mut self, unit: &str) -> bool {
        let unit_length = char_len(unit);
        let new_length = if self.buffer.is_empty() {
            unit_length
        } else {
            self.length + 1 + unit_length
        };

        if new_length > self.limit {
            return false;
        }

        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(unit);
        self.length = new_length;
        true
    }

    /// Emit the buffered text as a finished chunk and start over
    fn flush_into(&mut self, chunks: &mut Vec<String>) {
        if !self.buffer.is_empty() {
            chunks.push(std::mem::take(&mut self.buffer));
            self.length = 0;
        }
    }
}

/// Splits text into size-bounded, overlapping chunks
pub struct Segmenter {
    max_chunk_size: usize,
    overlap: usize,
    paragraph_regex: Regex,
    sentence_regex: Regex,
}

impl Segmenter {
    /// Create a segmenter. `max_chunk_size` must be positive.
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(CorpusError::Segmentation(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }

        let paragraph_regex = Regex::new(r"\n\s*\n").map_err(|e| {
            CorpusError::TextProcessing(format!("Failed to compile paragraph regex: {}", e))
        })?;

        let sentence_regex = Regex::new(&format!("[{}]+", SENTENCE_TERMINATORS)).map_err(|e| {
            CorpusError::TextProcessing(format!("Failed to compile sentence regex: {}", e))
        })?;

        Ok(Self {
            max_chunk_size,
            overlap,
            paragraph_regex,
            sentence_regex,
        })
    }

    /// Create a segmenter from the processing configuration
    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        Self::new(config.max_chunk_size, config.overlap)
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Segment text into chunks in document order
    pub fn segment(&self, text: &str) -> Vec<String> {
        let chunks = self.pack_paragraphs(text);
        self.apply_overlap(chunks)
    }

    fn pack_paragraphs(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut accumulator = Accumulator::new(self.max_chunk_size);

        for paragraph in self.paragraph_regex.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if char_len(paragraph) > self.max_chunk_size {
                accumulator.flush_into(&mut chunks);
                // Sentence leftovers stay buffered for the next paragraph
                self.pack_sentences(paragraph, &mut accumulator, &mut chunks);
            } else if !accumulator.try_push(paragraph) {
                accumulator.flush_into(&mut chunks);
                accumulator.try_push(paragraph);
            }
        }

        accumulator.flush_into(&mut chunks);
        chunks
    }

    fn pack_sentences(
        &self,
        paragraph: &str,
        accumulator: &mut Accumulator,
        chunks: &mut Vec<String>,
    ) {
        for sentence in self.split_sentences(paragraph) {
            if char_len(sentence) > self.max_chunk_size {
                accumulator.flush_into(chunks);
                chunks.extend(slice_chars(sentence, self.max_chunk_size));
            } else if !accumulator.try_push(sentence) {
                accumulator.flush_into(chunks);
                accumulator.try_push(sentence);
            }
        }
    }

    /// Split after every run of sentence terminators, keeping the terminators
    fn split_sentences<'a>(&self, paragraph: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for terminator in self.sentence_regex.find_iter(paragraph) {
            sentences.push(&paragraph[start..terminator.end()]);
            start = terminator.end();
        }
        if start < paragraph.len() {
            sentences.push(&paragraph[start..]);
        }

        sentences
            .into_iter()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    /// Prefix every short chunk after the first with the tail of its
    /// predecessor. Tails always come from the un-overlapped chunks.
    fn apply_overlap(&self, chunks: Vec<String>) -> Vec<String> {
        if self.overlap == 0 {
            return chunks;
        }

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                if i > 0 && char_len(chunk) < self.max_chunk_size {
                    format!("{} {}", tail_chars(&chunks[i - 1], self.overlap), chunk)
                } else {
                    chunk.clone()
                }
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `count` characters of `text`
fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

/// Cut `text` into pieces of exactly `size` characters; the last may be shorter
fn slice_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|piece| piece.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_chunk_size() {
        assert!(matches!(
            Segmenter::new(0, 10),
            Err(CorpusError::Segmentation(_))
        ));
    }

    #[test]
    fn test_small_text() {
        let segmenter = Segmenter::new(1000, 100).unwrap();
        let chunks = segmenter.segment("Short text");
        assert_eq!(chunks, vec!["Short text".to_string()]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        let segmenter = Segmenter::new(100, 10).unwrap();
        assert!(segmenter.segment("").is_empty());
        assert!(segmenter.segment("   \n\n  \n\n ").is_empty());
    }

    #[test]
    fn test_paragraph_packing() {
        let segmenter = Segmenter::new(25, 0).unwrap();
        let chunks = segmenter.segment("Alpha para.\n\nBeta para.\n\n\n  Gamma");
        assert_eq!(
            chunks,
            vec!["Alpha para. Beta para.".to_string(), "Gamma".to_string()]
        );
    }

    #[test]
    fn test_repeated_sentences() {
        let text = "Sentence one. ".repeat(100);
        let segmenter = Segmenter::new(100, 10).unwrap();
        let chunks = segmenter.segment(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() < 150, "chunk too long: {}", chunk.len());
            assert!(chunk.chars().count() <= 110);
        }
    }

    #[test]
    fn test_sentence_packing_keeps_terminators() {
        let segmenter = Segmenter::new(30, 0).unwrap();
        let chunks = segmenter.segment("First one here! Second one there? Third one everywhere.");
        assert_eq!(
            chunks,
            vec![
                "First one here!".to_string(),
                "Second one there?".to_string(),
                "Third one everywhere.".to_string(),
            ]
        );
    }

    #[test]
    fn test_cjk_terminators() {
        let segmenter = Segmenter::new(4, 0).unwrap();
        let chunks = segmenter.segment("第一句。第二句！第三句？");
        assert_eq!(chunks, vec!["第一句。", "第二句！", "第三句？"]);
    }

    #[test]
    fn test_force_split_long_sentence() {
        let segmenter = Segmenter::new(10, 0).unwrap();
        let chunks = segmenter.segment("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn test_overlap_skips_full_chunks() {
        let segmenter = Segmenter::new(10, 3).unwrap();
        let chunks = segmenter.segment("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "rst uvwxyz"]);
    }

    #[test]
    fn test_overlap_uses_original_predecessor() {
        let segmenter = Segmenter::new(10, 12).unwrap();
        let chunks = segmenter.segment("aaaa bbbb\n\ncccc dddd\n\neeee");
        assert_eq!(
            chunks,
            vec![
                "aaaa bbbb".to_string(),
                "aaaa bbbb cccc dddd".to_string(),
                "cccc dddd eeee".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_overlap_reconstructs_text() {
        let text = "The first paragraph talks about PDFs. It has two sentences.\n\n\
                    The second paragraph is a little longer and keeps going without stopping for quite a while\n\n\
                    Short tail.";
        let segmenter = Segmenter::new(40, 0).unwrap();
        let chunks = segmenter.segment(text);

        let rebuilt = chunks.join(" ");
        let expected = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let rebuilt_normalized = rebuilt.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(
            rebuilt_normalized.replace(' ', ""),
            expected.replace(' ', "")
        );
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
    }

    #[test]
    fn test_chunk_bound_with_overlap() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40)
            + "\n\n"
            + &"x".repeat(333)
            + "\n\nTail paragraph.";
        for (size, overlap) in [(50, 0), (50, 20), (77, 5), (200, 100)] {
            let segmenter = Segmenter::new(size, overlap).unwrap();
            for chunk in segmenter.segment(&text) {
                assert!(chunk.chars().count() <= size + overlap);
            }
        }
    }

    #[test]
    fn test_chunk_sequence() {
        let chunks = Chunk::sequence(vec!["één".to_string(), "two".to_string()]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].length, 3);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].content, "two");
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("hello", 3), "llo");
        assert_eq!(tail_chars("hello", 10), "hello");
        assert_eq!(tail_chars("héllo", 4), "éllo");
        assert_eq!(tail_chars("hello", 0), "");
    }
}
