// Format dispatch for document text extraction

use std::path::Path;

use creditmap_core::{DocumentFormat, ExtractedText, RawDocument};
use log::{debug, warn};

use crate::error::IoError;
use crate::{pdf, xlsx};

/// Extract normalized text from an uploaded document.
///
/// Never fails: parser errors come back as an `ExtractedText` carrying the
/// error marker, and unsupported formats yield empty text.
pub fn extract(document: &RawDocument) -> ExtractedText {
    let result = match document.format {
        DocumentFormat::Pdf => pdf::extract_text(&document.name, &document.bytes),
        DocumentFormat::Spreadsheet => xlsx::extract_text(document),
        DocumentFormat::PlainText => decode_utf8(document),
        DocumentFormat::Unsupported => {
            debug!("{}: unsupported format, no text extracted", document.name);
            return ExtractedText::empty();
        }
    };

    match result {
        Ok(raw) => {
            let text = ExtractedText::from_raw(&raw);
            debug!(
                "{}: extracted {} char(s) from {}",
                document.name,
                text.char_count(),
                document.format
            );
            text
        }
        Err(e) => {
            warn!("{}: extraction failed: {}", document.name, e);
            ExtractedText::failure(e)
        }
    }
}

/// Read a file from disk and extract its text. Read errors are reported the
/// same way as parser errors.
pub fn extract_path(path: &Path) -> ExtractedText {
    match RawDocument::from_path(path) {
        Ok(document) => extract(&document),
        Err(e) => {
            let err = IoError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            };
            warn!("{}", err);
            ExtractedText::failure(err)
        }
    }
}

fn decode_utf8(document: &RawDocument) -> Result<String, IoError> {
    std::str::from_utf8(&document.bytes)
        .map(str::to_owned)
        .map_err(|e| IoError::Encoding {
            name: document.name.clone(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditmap_core::normalize_whitespace;
    use proptest::prelude::*;

    fn text_doc(bytes: &[u8]) -> RawDocument {
        RawDocument::new("historico.txt", DocumentFormat::PlainText, bytes.to_vec())
    }

    #[test]
    fn plain_text_is_normalized() {
        let text = extract(&text_doc(b"  Calculus I\n\t60h \x00 A  "));
        assert!(!text.is_failure());
        assert_eq!(text.as_str(), "Calculus I 60h A");
    }

    #[test]
    fn invalid_utf8_is_a_failure() {
        let text = extract(&text_doc(&[0x43, 0xff, 0xfe]));
        assert!(text.is_failure());
        assert!(!text.is_usable());
        assert!(text.as_str().starts_with(creditmap_core::EXTRACTION_ERROR_MARKER));
    }

    #[test]
    fn unsupported_is_empty() {
        let document = RawDocument::new("photo.png", DocumentFormat::Unsupported, vec![1, 2, 3]);
        let text = extract(&document);
        assert!(!text.is_failure());
        assert_eq!(text.as_str(), "");
    }

    #[test]
    fn broken_pdf_is_a_failure() {
        let document = RawDocument::new("h.pdf", DocumentFormat::Pdf, b"%PDF-1.4 junk".to_vec());
        assert!(extract(&document).is_failure());
    }

    #[test]
    fn spreadsheet_text_is_flattened() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Disciplina").unwrap();
        sheet.write_string(1, 0, "Cálculo I").unwrap();
        sheet.write_number(1, 1, 80.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let document = RawDocument::new("h.xlsx", DocumentFormat::Spreadsheet, bytes);
        assert_eq!(extract(&document).as_str(), "Disciplina Cálculo I 80");
    }

    #[test]
    fn missing_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let text = extract_path(&dir.path().join("nope.txt"));
        assert!(text.is_failure());
    }

    #[test]
    fn extract_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.TXT");
        std::fs::write(&path, "Physics   I\n").unwrap();
        assert_eq!(extract_path(&path).as_str(), "Physics I");
    }

    #[test]
    fn multi_page_pdf_skips_the_blank_page() {
        let bytes = crate::pdf::sample_pdf(&["Transcript", "", "Calculus"]);
        let text = extract(&RawDocument::new("h.pdf", DocumentFormat::Pdf, bytes));
        assert!(text.is_usable());
        let words: Vec<&str> = text.as_str().split_whitespace().collect();
        assert_eq!(words, vec!["Transcript", "Calculus"]);
    }

    #[test]
    fn repeated_extraction_is_identical() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Disciplina").unwrap();
        sheet.write_string(1, 0, "Física I").unwrap();
        sheet.write_number(1, 1, 60.0).unwrap();

        let documents = [
            text_doc("Histórico\n  Cálculo I  90h".as_bytes()),
            RawDocument::new("m.xlsx", DocumentFormat::Spreadsheet, workbook.save_to_buffer().unwrap()),
            RawDocument::new("h.pdf", DocumentFormat::Pdf, crate::pdf::sample_pdf(&["Transcript", "", "Calculus"])),
            RawDocument::new("bad.pdf", DocumentFormat::Pdf, b"%PDF-1.4 junk".to_vec()),
        ];
        for document in &documents {
            let first = extract(document);
            let second = extract(document);
            assert_eq!(first, second, "{}", document.name);
        }
        assert!(extract(&documents[2]).is_usable());
        assert!(extract(&documents[3]).is_failure());
    }

    proptest! {
        #[test]
        fn extraction_output_is_already_normalized(s in "\\PC*") {
            let text = extract(&text_doc(s.as_bytes()));
            prop_assert_eq!(normalize_whitespace(text.as_str()), text.as_str());
        }
    }
}
