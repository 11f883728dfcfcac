use serde::Serialize;

/// Header substrings that usually mark the course-name column.
pub const DEFAULT_NAME_HINTS: [&str; 4] = ["discipline", "disciplina", "name", "nome"];

/// One row of the target institution's curriculum spreadsheet.
///
/// Cells are kept as displayed text in header order and passed through
/// unchanged; only the course-name column is ever interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurriculumMatrixRow {
    cells: Vec<String>,
}

impl CurriculumMatrixRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Cell at `col`, or `""` when the row is shorter than the header.
    pub fn get(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}

impl<S: Into<String>> FromIterator<S> for CurriculumMatrixRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// The target curriculum: a header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CurriculumMatrix {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<CurriculumMatrixRow>,
}

impl CurriculumMatrix {
    pub fn new(headers: Vec<String>, rows: Vec<CurriculumMatrixRow>) -> Self {
        Self {
            sheet: None,
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
