//! `creditmap-recon` — reconcile confirmed equivalences against a curriculum matrix.
//!
//! Pure engine crate: receives the confirmed set and the loaded matrix,
//! returns the waived/pending split and coverage metrics. No IO.

pub mod column;
pub mod engine;
pub mod evidence;
pub mod matcher;
pub mod model;

pub use column::{NameColumnStrategy, DEFAULT_NAME_HINTS};
pub use engine::reconcile;
pub use evidence::format_coverage;
pub use model::{ReconMetrics, ReconciliationReport};
