use std::fmt;
use std::path::Path;

/// Prefix carried by the text of a failed extraction.
pub const EXTRACTION_ERROR_MARKER: &str = "Error: ";

// ---------------------------------------------------------------------------
// RawDocument
// ---------------------------------------------------------------------------

/// Declared format of an uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    /// Tabular workbook (xlsx, xlsm, xls, xlsb, ods)
    Spreadsheet,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    /// Infer the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Self::Spreadsheet,
            "txt" => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::PlainText => "plain-text",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded artifact: payload plus declared format.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }

    /// Read a document from disk, inferring its format from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            format: DocumentFormat::from_path(path),
            bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// ExtractedText
// ---------------------------------------------------------------------------

/// Normalized plain text produced from exactly one [`RawDocument`].
///
/// Null bytes are removed, whitespace runs collapse to a single space and the
/// result is trimmed. A failed extraction keeps its description behind
/// [`EXTRACTION_ERROR_MARKER`] and is never usable downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    text: String,
    failed: bool,
}

impl ExtractedText {
    /// Normalize raw extractor output.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            text: normalize_whitespace(raw),
            failed: false,
        }
    }

    /// Placeholder payload for an extraction that went wrong.
    pub fn failure(description: impl fmt::Display) -> Self {
        let text = normalize_whitespace(&format!("{EXTRACTION_ERROR_MARKER}{description}"));
        Self { text, failed: true }
    }

    pub fn empty() -> Self {
        Self {
            text: String::new(),
            failed: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_failure(&self) -> bool {
        self.failed
    }

    /// False for failures and for documents with no text at all.
    pub fn is_usable(&self) -> bool {
        !self.failed && !self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Strip `\0`, collapse every whitespace run (newlines included) to one space, trim.
pub fn normalize_whitespace(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|&c| c != '\0').collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
