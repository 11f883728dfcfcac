use std::collections::BTreeSet;

use creditmap_core::{CurriculumMatrixRow, EquivalenceReview};

/// Comparison key for course names: trimmed and upper-cased.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Keys of every approved review's target course. Empty names are dropped.
pub fn approved_keys<'a, I>(approved: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a EquivalenceReview>,
{
    approved
        .into_iter()
        .map(|r| normalize_key(&r.proposal().target_course_name))
        .filter(|k| !k.is_empty())
        .collect()
}

/// Output of splitting the matrix rows by key membership.
#[derive(Debug, Default)]
pub struct RowSplit {
    pub waived: Vec<CurriculumMatrixRow>,
    pub pending: Vec<CurriculumMatrixRow>,
    /// Keys of rows that were waived
    pub matched_keys: BTreeSet<String>,
}

/// Split rows into waived and pending, preserving order. A row is waived
/// when its name cell normalizes to one of `keys`; rows with an empty name
/// never match.
pub fn split_rows(
    rows: &[CurriculumMatrixRow],
    name_col: Option<usize>,
    keys: &BTreeSet<String>,
) -> RowSplit {
    let mut split = RowSplit::default();
    for row in rows {
        let key = name_col.map(|col| normalize_key(row.get(col))).unwrap_or_default();
        if !key.is_empty() && keys.contains(&key) {
            split.waived.push(row.clone());
            split.matched_keys.insert(key);
        } else {
            split.pending.push(row.clone());
        }
    }
    split
}
