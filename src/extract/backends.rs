//! Extraction backends, from highest fidelity to most primitive

use super::{BackendKind, Document, ExtractionBackend};
use crate::error::{CorpusError, Result};
use lopdf::Object;
use lopdf::content::{Content, Operation};
use std::io::Write;
use std::process::{Command, Stdio};

/// poppler's `pdftotext`, run in layout mode with the PDF piped through stdin
pub struct PdftotextBackend {
    program: String,
}

impl PdftotextBackend {
    pub fn new() -> Self {
        Self::with_program("pdftotext")
    }

    /// Use a specific executable instead of `pdftotext` from `PATH`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftotextBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionBackend for PdftotextBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Pdftotext
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn try_extract(&self, document: &Document) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["-layout", "-enc", "UTF-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CorpusError::BackendUnavailable(format!("{} not found", self.program))
                }
                _ => CorpusError::Extraction(format!("Failed to run {}: {}", self.program, e)),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CorpusError::Extraction("pdftotext stdin unavailable".to_string()))?;
        let bytes = document.bytes();

        // Feed stdin from another thread so a full stdout pipe cannot deadlock us
        let output = std::thread::scope(|scope| {
            scope.spawn(move || {
                // A broken pipe here means pdftotext gave up; its exit status says why
                let _ = stdin.write_all(bytes);
            });
            child.wait_with_output()
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CorpusError::Extraction(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // Form feeds separate pages
        Ok(String::from_utf8_lossy(&output.stdout).replace('\x0c', "\n\n"))
    }
}

/// Text extraction through the `pdf-extract` crate
pub struct PdfExtractBackend;

impl ExtractionBackend for PdfExtractBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PdfExtract
    }

    fn try_extract(&self, document: &Document) -> Result<String> {
        let bytes = document.bytes();

        // pdf-extract panics on some malformed files instead of returning an error
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(CorpusError::Extraction(e.to_string())),
            Err(_) => Err(CorpusError::Extraction(
                "pdf-extract panicked while parsing".to_string(),
            )),
        }
    }
}

/// Page-by-page extraction with `lopdf`
pub struct LopdfBackend;

impl ExtractionBackend for LopdfBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Lopdf
    }

    fn try_extract(&self, document: &Document) -> Result<String> {
        let pdf = lopdf::Document::load_mem(document.bytes())?;

        let mut pages = Vec::new();
        for page_number in pdf.get_pages().into_keys() {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => log::debug!(
                    "{}: lopdf could not read page {}: {}",
                    document.identifier(),
                    page_number,
                    e
                ),
            }
        }

        Ok(pages.join("\n\n"))
    }
}

/// Last resort: the string operands of the text-showing operators in each
/// page's content stream, with no font decoding at all
pub struct RawContentBackend;

impl ExtractionBackend for RawContentBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RawContent
    }

    fn try_extract(&self, document: &Document) -> Result<String> {
        let pdf = lopdf::Document::load_mem(document.bytes())?;

        let mut pages = Vec::new();
        for (page_number, page_id) in pdf.get_pages() {
            let content = match pdf
                .get_page_content(page_id)
                .and_then(|data| Content::decode(&data))
            {
                Ok(content) => content,
                Err(e) => {
                    log::debug!(
                        "{}: skipping undecodable page {}: {}",
                        document.identifier(),
                        page_number,
                        e
                    );
                    continue;
                }
            };
            pages.push(text_from_operations(&content.operations));
        }

        Ok(pages.join("\n\n"))
    }
}

/// Kerning adjustment (thousandths of an em) wide enough to read as a space
const TJ_SPACE_THRESHOLD: f32 = -200.0;

fn text_from_operations(operations: &[Operation]) -> String {
    let mut text = String::new();

    for operation in operations {
        match operation.operator.as_str() {
            "Tj" => push_strings(&operation.operands, &mut text),
            "'" | "\"" => {
                push_line_break(&mut text);
                push_strings(&operation.operands, &mut text);
            }
            "TJ" => {
                for operand in &operation.operands {
                    let Object::Array(items) = operand else {
                        continue;
                    };
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                            Object::Integer(offset) if (*offset as f32) < TJ_SPACE_THRESHOLD => {
                                text.push(' ')
                            }
                            Object::Real(offset) if *offset < TJ_SPACE_THRESHOLD => text.push(' '),
                            _ => {}
                        }
                    }
                }
            }
            "Td" | "TD" | "T*" | "ET" => push_line_break(&mut text),
            _ => {}
        }
    }

    text
}

fn push_strings(operands: &[Object], text: &mut String) {
    for operand in operands {
        if let Object::String(bytes, _) = operand {
            text.push_str(&decode_pdf_string(bytes));
        }
    }
}

fn push_line_break(text: &mut String) {
    if !text.is_empty() && !text.ends_with(char::is_whitespace) {
        text.push('\n');
    }
}

/// Decode a PDF string: UTF-16BE when it carries a byte order mark,
/// otherwise byte-per-character, dropping control characters
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    bytes
        .iter()
        .map(|&byte| byte as char)
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}
