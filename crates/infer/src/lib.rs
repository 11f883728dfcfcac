//! `creditmap-infer` — asks a language model to propose course equivalences.
//!
//! The client sends both documents in one request and validates the JSON
//! it gets back before anything reaches the review session.

pub mod client;
pub mod error;
pub mod prompt;
pub mod response;

pub use client::EquivalenceClient;
pub use error::{InferError, ServiceError};
pub use prompt::{truncate_chars, MAX_INPUT_CHARS};

use creditmap_core::{Analysis, ExtractedText};

/// Anything that can turn two document texts into an [`Analysis`].
pub trait EquivalenceInference {
    fn infer(&self, student_text: &str, matrix_text: &str) -> Result<Analysis, InferError>;
}

/// Run one analysis over extracted documents.
///
/// If either document is unusable (extraction failed or no text), the
/// result is an empty analysis and the service is not called.
pub fn analyze<I: EquivalenceInference + ?Sized>(
    inference: &I,
    student: &ExtractedText,
    matrix: &ExtractedText,
) -> Result<Analysis, InferError> {
    if !student.is_usable() || !matrix.is_usable() {
        log::warn!(
            "skipping inference: transcript usable={}, matrix usable={}",
            student.is_usable(),
            matrix.is_usable()
        );
        return Ok(Analysis::empty());
    }
    inference.infer(student.as_str(), matrix.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
    }

    impl EquivalenceInference for Counting {
        fn infer(&self, _: &str, _: &str) -> Result<Analysis, InferError> {
            self.calls.set(self.calls.get() + 1);
            Err(InferError::EmptyResponse)
        }
    }

    #[test]
    fn unusable_documents_skip_the_service() {
        let backend = Counting { calls: Cell::new(0) };
        let good = ExtractedText::from_raw("Cálculo I");

        let analysis = analyze(&backend, &ExtractedText::failure("broken pdf"), &good).unwrap();
        assert!(analysis.proposals.is_empty());
        let analysis = analyze(&backend, &good, &ExtractedText::empty()).unwrap();
        assert!(analysis.proposals.is_empty());
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn usable_documents_reach_the_service() {
        let backend = Counting { calls: Cell::new(0) };
        let good = ExtractedText::from_raw("Cálculo I");
        assert!(matches!(analyze(&backend, &good, &good), Err(InferError::EmptyResponse)));
        assert_eq!(backend.calls.get(), 1);
    }
}
