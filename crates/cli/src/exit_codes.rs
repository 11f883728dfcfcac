//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | CLI usage error (bad args, missing file)      |
//! | 10-19   | ai        | Configuration and inference service failures  |
//! | 20-29   | review    | Review session and reconciliation inputs      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use creditmap_infer::{InferError, ServiceError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input file, unreadable settings file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none in settings).
pub const EXIT_AI_DISABLED: u8 = 10;

/// AI provider configured but API key missing.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// The service answered without any text.
pub const EXIT_AI_EMPTY_RESPONSE: u8 = 13;

/// The model's text was not JSON or did not match the response schema.
pub const EXIT_AI_MALFORMED: u8 = 14;

/// Network failure or non-404 HTTP error from the service.
pub const EXIT_AI_SERVICE: u8 = 15;

/// HTTP 404: the model does not exist or the key cannot use it.
pub const EXIT_AI_MODEL_UNAVAILABLE: u8 = 16;

// =============================================================================
// Review (20-29)
// =============================================================================

/// Reviewer quit (or input ended) before finalizing.
pub const EXIT_REVIEW_ABORTED: u8 = 20;

/// Curriculum matrix could not be loaded as a spreadsheet.
pub const EXIT_MATRIX_UNREADABLE: u8 = 21;

/// Map an inference failure to its exit code.
pub fn infer_exit_code(err: &InferError) -> u8 {
    match err {
        InferError::NotConfigured(_) => EXIT_AI_MISSING_KEY,
        InferError::EmptyResponse => EXIT_AI_EMPTY_RESPONSE,
        InferError::MalformedResponse(_) => EXIT_AI_MALFORMED,
        InferError::Service(ServiceError::ModelUnavailable { .. }) => EXIT_AI_MODEL_UNAVAILABLE,
        InferError::Service(_) => EXIT_AI_SERVICE,
    }
}
