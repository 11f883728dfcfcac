use crate::model::ReconMetrics;

/// Counts and coverage from the row split.
pub fn compute_metrics(waived_rows: usize, pending_rows: usize) -> ReconMetrics {
    let total_rows = waived_rows + pending_rows;
    let coverage_ratio = if total_rows == 0 {
        0.0
    } else {
        waived_rows as f64 / total_rows as f64
    };
    ReconMetrics {
        waived_count: waived_rows,
        pending_count: pending_rows,
        total_rows,
        coverage_ratio,
    }
}

/// Coverage as a percentage with one decimal place, e.g. `"50.0%"`.
pub fn format_coverage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
