//! `creditmap-core` — shared types for the credit-transfer pipeline.
//!
//! Documents and their extracted text, the model's equivalence proposals,
//! the curriculum matrix, and the review session that turns proposals into
//! a confirmed set. No IO, no network.

pub mod document;
pub mod equivalence;
pub mod matrix;
pub mod session;

pub use document::{
    normalize_whitespace, DocumentFormat, ExtractedText, RawDocument, EXTRACTION_ERROR_MARKER,
};
pub use equivalence::{
    Analysis, ConfirmedEquivalenceSet, EquivalenceProposal, EquivalenceReview, UsageMetadata,
    Verdict,
};
pub use matrix::{CurriculumMatrix, CurriculumMatrixRow, DEFAULT_NAME_HINTS};
pub use session::{ReviewSession, RunTicket, SessionError, SessionState};
