//! Terminal tables for the review step and the final report.

use std::io::{self, Write};

use creditmap_core::{CurriculumMatrixRow, EquivalenceReview, UsageMetadata};
use creditmap_recon::{format_coverage, ReconciliationReport};
use serde::Serialize;

use crate::util::{display_width, pad_left, pad_right};

const COURSE_WIDTH: usize = 32;
const RATIONALE_WIDTH: usize = 40;

/// Numbered approval table.
pub(crate) fn write_review_table<W: Write>(out: &mut W, reviews: &[EquivalenceReview]) -> io::Result<()> {
    if reviews.is_empty() {
        writeln!(out, "No equivalences proposed.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{}  {}  {}  {}  {}  {}  {}",
        pad_left("#", 3),
        "OK ",
        pad_right("Source course", COURSE_WIDTH),
        pad_right("Target course", COURSE_WIDTH),
        " Sim",
        pad_right("Verdict", 10),
        "Rationale"
    )?;
    writeln!(out, "{}", "-".repeat(3 + 2 + 3 + 2 + COURSE_WIDTH * 2 + 4 + 4 + 2 + 10 + 2 + RATIONALE_WIDTH))?;

    for (i, review) in reviews.iter().enumerate() {
        let p = review.proposal();
        writeln!(
            out,
            "{}  {}  {}  {}  {}  {}  {}",
            pad_left(&(i + 1).to_string(), 3),
            if review.approved() { "[x]" } else { "[ ]" },
            pad_right(&p.source_course_name, COURSE_WIDTH),
            pad_right(&p.target_course_name, COURSE_WIDTH),
            format!("{:.2}", p.similarity_score),
            pad_right(p.verdict.wire_value(), 10),
            pad_right(&p.rationale, RATIONALE_WIDTH).trim_end()
        )?;
    }
    Ok(())
}

/// Human-readable final report.
pub(crate) fn write_report<W: Write>(
    out: &mut W,
    report: &ReconciliationReport,
    headers: &[String],
    student_name: Option<&str>,
) -> io::Result<()> {
    let m = &report.metrics;

    writeln!(out)?;
    writeln!(out, "Credit Transfer Report")?;
    writeln!(out, "══════════════════════════════")?;
    if let Some(name) = student_name {
        writeln!(out, "Student:   {}", name)?;
    }
    if let Some(col) = &report.name_column {
        writeln!(out, "Matched on column: {}", col)?;
    }
    writeln!(out, "Waived:    {}", m.waived_count)?;
    writeln!(out, "Pending:   {}", m.pending_count)?;
    writeln!(out, "Coverage:  {} ({} of {} rows)", format_coverage(m.coverage_ratio), m.waived_count, m.total_rows)?;

    writeln!(out)?;
    writeln!(out, "Approved equivalences ({})", report.waived.len())?;
    for review in &report.waived {
        let p = review.proposal();
        writeln!(out, "  {} -> {}", p.source_course_name, p.target_course_name)?;
    }

    if !report.unmatched.is_empty() {
        writeln!(out)?;
        writeln!(out, "Approved but not found in the matrix ({})", report.unmatched.len())?;
        for review in &report.unmatched {
            writeln!(out, "  {}", review.proposal().target_course_name)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Waived courses ({})", report.waived_rows.len())?;
    write_rows(out, headers, &report.waived_rows)?;

    writeln!(out)?;
    writeln!(out, "Pending courses ({})", report.pending.len())?;
    write_rows(out, headers, &report.pending)?;
    Ok(())
}

fn write_rows<W: Write>(out: &mut W, headers: &[String], rows: &[CurriculumMatrixRow]) -> io::Result<()> {
    if rows.is_empty() {
        writeln!(out, "  (none)")?;
        return Ok(());
    }

    let widths: Vec<usize> = (0..headers.len())
        .map(|c| {
            rows.iter()
                .map(|r| display_width(r.get(c)))
                .chain(std::iter::once(display_width(&headers[c])))
                .max()
                .unwrap_or(0)
                .min(COURSE_WIDTH)
        })
        .collect();

    let header_cells: Vec<&str> = headers.iter().map(String::as_str).collect();
    writeln!(out, "  {}", format_line(&header_cells, &widths))?;
    for row in rows {
        let cells: Vec<&str> = (0..headers.len()).map(|c| row.get(c)).collect();
        writeln!(out, "  {}", format_line(&cells, &widths))?;
    }
    Ok(())
}

fn format_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| pad_right(cell, *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Machine-readable output of `analyze --json`.
#[derive(Serialize)]
pub(crate) struct AnalyzeOutput<'a> {
    pub schema_version: u32,
    pub student_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<&'a UsageMetadata>,
    pub headers: &'a [String],
    pub coverage: String,
    pub report: &'a ReconciliationReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditmap_core::{ConfirmedEquivalenceSet, CurriculumMatrix, EquivalenceProposal, Verdict};
    use creditmap_recon::{reconcile, NameColumnStrategy};

    fn review(target: &str, approved: bool) -> EquivalenceReview {
        EquivalenceReview::with_approval(
            EquivalenceProposal {
                source_course_name: format!("{target} A"),
                target_course_name: target.into(),
                similarity_score: 0.87,
                verdict: Verdict::Granted,
                rationale: "mesma ementa".into(),
            },
            approved,
        )
    }

    #[test]
    fn review_table_rows() {
        let mut out = Vec::new();
        write_review_table(&mut out, &[review("Cálculo I", true), review("Física I", false)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("  1  [x]  Cálculo I A"));
        assert!(lines[2].contains("0.87"));
        assert!(lines[2].contains("DEFERIDO"));
        assert!(lines[3].starts_with("  2  [ ]  Física I A"));
    }

    #[test]
    fn empty_review_table() {
        let mut out = Vec::new();
        write_review_table(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No equivalences proposed.\n");
    }

    #[test]
    fn report_text() {
        let matrix = CurriculumMatrix::new(
            vec!["Name".into(), "Hours".into()],
            vec![
                ["Calculus I", "60"].into_iter().collect(),
                ["Physics I", "60"].into_iter().collect(),
            ],
        );
        let confirmed = ConfirmedEquivalenceSet::from_reviews(vec![review("Calculus I", true)]);
        let report = reconcile(&confirmed, &matrix, &NameColumnStrategy::default());

        let mut out = Vec::new();
        write_report(&mut out, &report, &matrix.headers, Some("Ana")).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Student:   Ana"));
        assert!(text.contains("Coverage:  50.0% (1 of 2 rows)"));
        assert!(text.contains("Calculus I A -> Calculus I"));
        assert!(text.contains("Pending courses (1)\n  Name       Hours\n  Physics I  60"));
    }
}
