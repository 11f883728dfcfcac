use creditmap_core::{ConfirmedEquivalenceSet, CurriculumMatrix, EquivalenceReview};

use crate::column::NameColumnStrategy;
use crate::evidence::{compute_metrics, format_coverage};
use crate::matcher::{approved_keys, normalize_key, split_rows};
use crate::model::ReconciliationReport;

/// Reconcile the confirmed equivalences against the curriculum matrix.
///
/// Every matrix row lands in exactly one of `waived_rows` / `pending`.
/// Deterministic apart from `generated_at`.
pub fn reconcile(
    confirmed: &ConfirmedEquivalenceSet,
    matrix: &CurriculumMatrix,
    strategy: &NameColumnStrategy,
) -> ReconciliationReport {
    let name_col = strategy.resolve(&matrix.headers);
    let name_column = name_col.and_then(|i| matrix.headers.get(i).cloned());

    let waived: Vec<EquivalenceReview> = confirmed.approved().cloned().collect();
    let keys = approved_keys(&waived);
    let split = split_rows(&matrix.rows, name_col, &keys);

    let unmatched: Vec<EquivalenceReview> = waived
        .iter()
        .filter(|r| !split.matched_keys.contains(&normalize_key(&r.proposal().target_course_name)))
        .cloned()
        .collect();

    let metrics = compute_metrics(split.waived.len(), split.pending.len());

    log::info!(
        "reconciled {} approved equivalence(s) against {} row(s): {} waived, {} pending ({})",
        waived.len(),
        metrics.total_rows,
        metrics.waived_count,
        metrics.pending_count,
        format_coverage(metrics.coverage_ratio)
    );
    if !unmatched.is_empty() {
        log::warn!("{} approved equivalence(s) name no matrix row", unmatched.len());
    }

    ReconciliationReport {
        waived,
        waived_rows: split.waived,
        pending: split.pending,
        unmatched,
        metrics,
        name_column,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}
