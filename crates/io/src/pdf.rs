// PDF transcript text extraction

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::IoError;

/// Extract the text of every page, in page order.
///
/// A page with no extractable text yields an empty string. The PDF parser
/// can panic on malformed input; that is reported as an error instead.
pub fn page_texts(name: &str, bytes: &[u8]) -> Result<Vec<String>, IoError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(IoError::Pdf {
            name: name.to_string(),
            message: e.to_string(),
        }),
        Err(payload) => Err(IoError::Pdf {
            name: name.to_string(),
            message: format!("parser panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

/// Whole-document text: pages concatenated in order.
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, IoError> {
    let pages = page_texts(name, bytes)?;
    let empty_pages = pages.iter().filter(|p| p.trim().is_empty()).count();
    if empty_pages > 0 {
        log::debug!("{name}: {empty_pages} of {} page(s) had no extractable text", pages.len());
    }
    Ok(join_pages(&pages))
}

pub fn join_pages(pages: &[String]) -> String {
    pages.concat()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Minimal multi-page PDF, one Helvetica text line per page. An empty
/// string gives a page with an empty content stream.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let font_id = 3 + 2 * pages.len();
    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()),
    ];
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            font_id,
            4 + 2 * i
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
        };
        objects.push(format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream));
    }
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}
