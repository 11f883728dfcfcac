use creditmap_core::{CurriculumMatrixRow, EquivalenceReview};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconMetrics {
    /// Distinct matrix rows covered by an approved equivalence
    pub waived_count: usize,
    pub pending_count: usize,
    pub total_rows: usize,
    /// `waived_count / total_rows`, 0 for an empty matrix
    pub coverage_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Approved reviews, in confirmed order
    pub waived: Vec<EquivalenceReview>,
    /// Matrix rows matched by an approved review, in matrix order
    pub waived_rows: Vec<CurriculumMatrixRow>,
    /// Every other matrix row, in matrix order
    pub pending: Vec<CurriculumMatrixRow>,
    /// Approved reviews whose target names no matrix row
    pub unmatched: Vec<EquivalenceReview>,
    pub metrics: ReconMetrics,
    /// Header of the column used as course name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_column: Option<String>,
    pub engine_version: String,
    pub generated_at: String,
}
