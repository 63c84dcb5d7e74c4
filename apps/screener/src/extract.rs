//! PDF text extraction.
//!
//! Extraction never fails the caller: every outcome is a value, so the
//! pipeline keeps running and the analysis stages reason about degraded
//! evidence (missing file, corrupt PDF, blank scan) instead of crashing.

use std::path::Path;

/// Outcome of extracting text from one document.
///
/// Variants are ordered by precedence: a missing file is reported as
/// `NotFound` even if its extension would also be unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Page texts in page order, newline-joined, wrapped in begin/end
    /// markers embedding the source path so a consumer can locate one
    /// document's text inside a concatenated prompt.
    Success { text: String },
    NotFound,
    UnsupportedType,
    ParseError(String),
    /// The document parsed but contains no non-whitespace text. Distinct
    /// from success: downstream treats it as missing evidence, not as a
    /// hard failure.
    EmptyContent,
}

impl Extraction {
    /// Renders the outcome as prompt text. Failures become explanatory
    /// strings handed to the analysis stage, so a stage receiving a corrupt
    /// or missing document still completes its run.
    pub fn into_prompt_text(self, path: &Path) -> String {
        match self {
            Extraction::Success { text } => text,
            Extraction::NotFound => {
                format!("Error: File not found at '{}'", path.display())
            }
            Extraction::UnsupportedType => {
                format!("Error: File '{}' is not a PDF file", path.display())
            }
            Extraction::ParseError(cause) => {
                format!("Error: Could not parse PDF '{}': {cause}", path.display())
            }
            Extraction::EmptyContent => {
                format!("Warning: No text content found in PDF '{}'", path.display())
            }
        }
    }
}

/// Extracts the text of a PDF document.
///
/// Blocking (CPU and I/O bound) — callers on the async path must wrap this
/// in `tokio::task::spawn_blocking`. The underlying document handle is
/// scoped to this call and released on every path, error paths included.
pub fn extract(path: &Path) -> Extraction {
    if !path.exists() {
        return Extraction::NotFound;
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Extraction::UnsupportedType;
    }

    match pdf_extract::extract_text(path) {
        Ok(raw) => finish(path, &raw),
        Err(e) => Extraction::ParseError(e.to_string()),
    }
}

/// Classifies raw extracted text and wraps non-empty text in markers.
fn finish(path: &Path, raw: &str) -> Extraction {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Extraction::EmptyContent;
    }
    Extraction::Success {
        text: format!(
            "-----------Begin document: {path}-----------\n{text}\n-----------End document: {path}-----------",
            path = path.display(),
            text = trimmed,
        ),
    }
}
