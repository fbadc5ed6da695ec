//! Layered PDF text extraction
//!
//! PDF text extraction is unreliable: a backend may be missing, may choke on
//! a file, or may return a handful of garbage characters. The
//! [`ExtractionChain`] tries an ordered list of backends, best first, and
//! settles for the most primitive one when nothing better clears the quality
//! bar.

pub mod backends;

use crate::error::{CorpusError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

pub use backends::{LopdfBackend, PdfExtractBackend, PdftotextBackend, RawContentBackend};

/// A document to process: an identifier plus its raw bytes
#[derive(Debug, Clone)]
pub struct Document {
    identifier: String,
    path: Option<PathBuf>,
    bytes: Vec<u8>,
}

impl Document {
    /// Read a document from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        Ok(Self {
            identifier: path.display().to_string(),
            path: Some(path.to_path_buf()),
            bytes,
        })
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(identifier: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            path: None,
            bytes,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Final path component of the identifier
    pub fn filename(&self) -> String {
        Path::new(&self.identifier)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identifier.clone())
    }

    /// File name without its extension
    pub fn stem(&self) -> String {
        Path::new(&self.identifier)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identifier.clone())
    }
}

/// Identifies which extraction strategy produced a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// poppler's `pdftotext` command-line tool
    Pdftotext,
    /// The `pdf-extract` crate
    PdfExtract,
    /// `lopdf`'s page text extraction
    Lopdf,
    /// Raw text-showing operators from page content streams
    RawContent,
    /// Any other backend
    Custom(&'static str),
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Pdftotext => "pdftotext",
            BackendKind::PdfExtract => "pdf-extract",
            BackendKind::Lopdf => "lopdf",
            BackendKind::RawContent => "raw-content",
            BackendKind::Custom(name) => *name,
        };
        f.write_str(name)
    }
}

/// A strategy able to pull raw text out of a document
pub trait ExtractionBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Whether the backend can run in this environment. Queried once, when
    /// the chain is built.
    fn is_available(&self) -> bool {
        true
    }

    /// Extract the document's text
    fn try_extract(&self, document: &Document) -> Result<String>;
}

/// Outcome of running the chain on one document
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Extracted text, untouched
    pub text: String,
    /// Backend whose output was accepted
    pub backend_used: BackendKind,
    /// Whether the accepted text met the minimum length
    pub succeeded: bool,
}

struct Strategy {
    backend: Box<dyn ExtractionBackend>,
    available: bool,
}

/// Ordered fallback chain of extraction backends
pub struct ExtractionChain {
    strategies: Vec<Strategy>,
    min_text_length: usize,
}

impl ExtractionChain {
    /// Build a chain from backends ordered best first; the last one is the
    /// last resort. Availability is probed here, once per backend.
    pub fn new(backends: Vec<Box<dyn ExtractionBackend>>, min_text_length: usize) -> Self {
        let strategies = backends
            .into_iter()
            .map(|backend| {
                let available = backend.is_available();
                if !available {
                    log::debug!("Extraction backend {} unavailable, skipping", backend.kind());
                }
                Strategy { backend, available }
            })
            .collect();

        Self {
            strategies,
            min_text_length,
        }
    }

    /// The standard chain: pdftotext, pdf-extract, lopdf, raw content streams
    pub fn with_default_backends(min_text_length: usize) -> Self {
        let backends: Vec<Box<dyn ExtractionBackend>> = vec![
            Box::new(PdftotextBackend::new()),
            Box::new(PdfExtractBackend),
            Box::new(LopdfBackend),
            Box::new(RawContentBackend),
        ];
        Self::new(backends, min_text_length)
    }

    pub fn min_text_length(&self) -> usize {
        self.min_text_length
    }

    /// Backends that will actually be tried, in order
    pub fn available_backends(&self) -> Vec<BackendKind> {
        self.strategies
            .iter()
            .filter(|strategy| strategy.available)
            .map(|strategy| strategy.backend.kind())
            .collect()
    }

    /// Run the chain on a document.
    ///
    /// Returns the first text whose trimmed length reaches
    /// `min_text_length`, or else the last-resort backend's text as is.
    /// Fails only when no backend could read the document at all.
    pub fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        let available: Vec<&Strategy> = self
            .strategies
            .iter()
            .filter(|strategy| strategy.available)
            .collect();

        let Some(last) = available.len().checked_sub(1) else {
            return Err(CorpusError::DocumentUnreadable {
                document: document.identifier().to_string(),
                reason: "no extraction backend available".to_string(),
            });
        };

        let mut opened = false;
        let mut errors = Vec::new();

        for (position, strategy) in available.iter().enumerate() {
            let kind = strategy.backend.kind();
            let is_last_resort = position == last;

            match strategy.backend.try_extract(document) {
                Ok(text) => {
                    opened = true;
                    let length = text.trim().chars().count();
                    let succeeded = length > 0 && length >= self.min_text_length;

                    if succeeded || is_last_resort {
                        if succeeded {
                            log::debug!(
                                "{}: extracted {} chars with {}",
                                document.identifier(),
                                length,
                                kind
                            );
                        } else {
                            log::warn!(
                                "{}: accepting last-resort {} output below quality threshold ({} < {})",
                                document.identifier(),
                                kind,
                                length,
                                self.min_text_length
                            );
                        }
                        return Ok(ExtractionResult {
                            text,
                            backend_used: kind,
                            succeeded,
                        });
                    }

                    log::debug!(
                        "{}: {} returned {} chars (< {}), falling back",
                        document.identifier(),
                        kind,
                        length,
                        self.min_text_length
                    );
                }
                Err(e) => {
                    log::warn!("{}: {} extraction failed: {}", document.identifier(), kind, e);
                    errors.push(format!("{}: {}", kind, e));
                }
            }
        }

        if opened {
            // The last resort failed after an earlier backend read the file
            let kind = available[last].backend.kind();
            log::warn!(
                "{}: last-resort {} failed, returning empty text",
                document.identifier(),
                kind
            );
            return Ok(ExtractionResult {
                text: String::new(),
                backend_used: kind,
                succeeded: false,
            });
        }

        Err(CorpusError::DocumentUnreadable {
            document: document.identifier().to_string(),
            reason: errors.join("; "),
        })
    }
}
