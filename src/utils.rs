//! Utility functions for pdfcorpus-rs
//!
//! Document discovery plus small path and formatting helpers.

use crate::error::{CorpusError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Get file extension from path, lowercased
pub fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Whether the path's extension is one of `extensions`.
///
/// Filters may be written with or without the leading dot and are compared
/// case-insensitively.
pub fn matches_extension<P: AsRef<Path>, S: AsRef<str>>(path: P, extensions: &[S]) -> bool {
    let Some(ext) = get_file_extension(path) else {
        return false;
    };

    extensions
        .iter()
        .any(|filter| filter.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

/// Recursively collect the files under `folder` whose extension matches one
/// of `extensions`, sorted so enumeration is deterministic
pub fn collect_documents<P: AsRef<Path>, S: AsRef<str>>(
    folder: P,
    extensions: &[S],
) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();

    if !folder.is_dir() {
        return Err(CorpusError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input folder not found: {}", folder.display()),
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(folder).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && matches_extension(entry.path(), extensions) {
            documents.push(entry.into_path());
        }
    }

    documents.sort();
    log::debug!(
        "Found {} documents under {}",
        documents.len(),
        folder.display()
    );
    Ok(documents)
}

/// Create directory if it doesn't exist
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        std::fs::create_dir_all(path).map_err(CorpusError::Io)?;
    }

    Ok(())
}

/// Format file size in human readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Escape special characters for safe file naming
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
