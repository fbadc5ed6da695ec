//! Cleaning of raw extracted PDF text
//!
//! Extractors leave behind page numbers, running headers with copyright
//! lines and letters scattered by over-eager whitespace insertion. The
//! normalizer removes those artifacts before segmentation.

use crate::error::{CorpusError, Result};
use regex::Regex;

/// Characters that end a sentence, shared with the segmenter
pub(crate) const SENTENCE_TERMINATORS: &str = ".!?。！？";

/// Text normalizer with precompiled boilerplate patterns
pub struct TextNormalizer {
    whitespace_regex: Regex,
    page_marker_regexes: Vec<Regex>,
    notice_regexes: Vec<Regex>,
    split_letters_regex: Regex,
}

impl TextNormalizer {
    /// Compile the normalizer's patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                CorpusError::TextProcessing(format!(
                    "Failed to compile pattern {}: {}",
                    pattern, e
                ))
            })
        };

        // Up to and including the end of the current sentence
        let to_sentence_end = format!("[^{t}]*[{t}]*", t = SENTENCE_TERMINATORS);

        let page_marker_regexes = [
            r"(?i)\bpage\s*\d+\s*(?:of|/)\s*\d+\b",
            r"(?i)\bseite\s*\d+\s*von\s*\d+\b",
            r"(?i)\bpage\s*\d+\s*sur\s*\d+\b",
            r"(?i)\bp[áa]gina\s*\d+\s*de\s*\d+\b",
            r"第\s*\d+\s*页\s*(?:共\s*\d+\s*页)?",
        ]
        .into_iter()
        .map(compile)
        .collect::<Result<Vec<_>>>()?;

        let notice_regexes = vec![
            compile(&format!(r"(?i)\bcopyright\s+{}", to_sentence_end))?,
            compile(&format!(r"©\s*{}", to_sentence_end))?,
            compile(&format!(r"(?i)\bthis material may be\b{}", to_sentence_end))?,
            compile(r"(?i)\bretrieved from\s+https?://\S*")?,
            compile(&format!(r"(?i)\ball rights reserved\b{}", to_sentence_end))?,
        ];

        Ok(Self {
            whitespace_regex: compile(r"\s+")?,
            page_marker_regexes,
            notice_regexes,
            // Single letters delimited by spaces or the text edges on both sides
            split_letters_regex: compile(r"(^| )([A-Za-z](?: [A-Za-z])+)( |$)")?,
        })
    }

    /// Clean raw extracted text.
    ///
    /// Runs whitespace collapsing, boilerplate removal, the letter-merge
    /// repair and a final trim, in that order. The letter merge is a lossy
    /// heuristic: two genuine one-letter words in a row ("a b") are joined
    /// too.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let collapsed = self.collapse_whitespace(text);
        let stripped = self.remove_boilerplate(&collapsed);
        let repaired = self.merge_split_letters(&stripped);

        repaired.trim().to_string()
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_regex.replace_all(text, " ").into_owned()
    }

    fn remove_boilerplate(&self, text: &str) -> String {
        let mut text = text.to_string();

        // Page markers and notices can contain or border on numbers, so
        // bare numbers go last
        for regex in &self.page_marker_regexes {
            text = regex.replace_all(&text, " ").into_owned();
        }

        for regex in &self.notice_regexes {
            text = regex.replace_all(&text, " ").into_owned();
        }

        text = text
            .split(' ')
            .filter(|token| !is_page_number(token))
            .collect::<Vec<_>>()
            .join(" ");

        self.collapse_whitespace(&text)
    }

    fn merge_split_letters(&self, text: &str) -> String {
        self.split_letters_regex
            .replace_all(text, |caps: &regex::Captures| {
                format!("{}{}{}", &caps[1], caps[2].replace(' ', ""), &caps[3])
            })
            .into_owned()
    }
}

/// A whitespace-delimited token made only of ASCII digits
fn is_page_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
