// Excel import (xlsx, xls, xlsb, ods) for curriculum matrices

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use creditmap_core::{CurriculumMatrix, CurriculumMatrixRow, DocumentFormat, RawDocument};

use crate::error::IoError;

/// Cell grid of one worksheet, rendered as display text.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Read the first worksheet of a workbook held in memory.
///
/// Only the first sheet is considered: curriculum exports keep the matrix
/// there, and later sheets are usually notes or lookups.
pub fn read_first_sheet(document: &RawDocument) -> Result<SheetGrid, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(document.bytes.clone()))
        .map_err(|e| IoError::Workbook {
            name: document.name.clone(),
            message: e.to_string(),
        })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::NoSheets(document.name.clone()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::Workbook {
            name: document.name.clone(),
            message: format!("failed to read sheet '{}': {}", sheet_name, e),
        })?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(SheetGrid {
        name: sheet_name,
        rows,
    })
}

/// Whole first sheet (header included) as a text blob, one line per row.
pub fn extract_text(document: &RawDocument) -> Result<String, IoError> {
    let grid = read_first_sheet(document)?;
    let lines: Vec<String> = grid
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .filter(|cell| !cell.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Load the curriculum matrix: first non-empty row is the header, every
/// later row with at least one value is a data row.
pub fn load_matrix(document: &RawDocument) -> Result<CurriculumMatrix, IoError> {
    if document.format != DocumentFormat::Spreadsheet {
        return Err(IoError::NotASpreadsheet {
            name: document.name.clone(),
            format: document.format.to_string(),
        });
    }

    let grid = read_first_sheet(document)?;
    let mut rows = grid.rows.into_iter().filter(|row| !is_blank(row));

    let header_row = rows
        .next()
        .ok_or_else(|| IoError::EmptySheet(grid.name.clone()))?;
    let data_rows: Vec<Vec<String>> = rows.collect();

    let width = data_rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);

    let headers: Vec<String> = (0..width)
        .map(|col| {
            let text = header_row.get(col).map(|h| h.trim()).unwrap_or("");
            if text.is_empty() {
                format!("Column {}", col_to_letter(col))
            } else {
                text.to_string()
            }
        })
        .collect();

    let rows: Vec<CurriculumMatrixRow> = data_rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, String::new());
            CurriculumMatrixRow::new(cells)
        })
        .collect();

    log::info!(
        "{}: loaded {} curriculum row(s) x {} column(s) from sheet '{}'",
        document.name,
        rows.len(),
        headers.len(),
        grid.name
    );

    Ok(CurriculumMatrix {
        sheet: Some(grid.name),
        headers,
        rows,
    })
}

pub fn load_matrix_path(path: &Path) -> Result<CurriculumMatrix, IoError> {
    let document = RawDocument::from_path(path).map_err(|e| IoError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_matrix(&document)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Display text of one cell.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals ("60", not "60.0")
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Matriz").unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) => sheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn doc(bytes: Vec<u8>) -> RawDocument {
        RawDocument::new("matriz.xlsx", DocumentFormat::Spreadsheet, bytes)
    }

    #[test]
    fn matrix_header_and_rows() {
        let bytes = workbook_bytes(&[
            &["Período", "Disciplina", "Carga Horária"],
            &["1", "Cálculo I", "80"],
            &["1", "Física I", "60"],
        ]);
        let matrix = load_matrix(&doc(bytes)).unwrap();
        assert_eq!(matrix.sheet.as_deref(), Some("Matriz"));
        assert_eq!(matrix.headers, vec!["Período", "Disciplina", "Carga Horária"]);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].get(1), "Cálculo I");
        assert_eq!(matrix.rows[1].get(2), "60");
    }

    #[test]
    fn blank_rows_skipped_and_short_rows_padded() {
        let bytes = workbook_bytes(&[
            &["Name", "Hours", "Notes"],
            &["Calculus I", "60"],
            &["", "", ""],
            &["Physics I"],
        ]);
        let matrix = load_matrix(&doc(bytes)).unwrap();
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[1].cells().len(), 3);
        assert_eq!(matrix.rows[1].get(0), "Physics I");
        assert_eq!(matrix.rows[1].get(2), "");
    }

    #[test]
    fn unnamed_header_cells_get_letters() {
        let bytes = workbook_bytes(&[&["Name", ""], &["Calculus I", "60", "x"]]);
        let matrix = load_matrix(&doc(bytes)).unwrap();
        assert_eq!(matrix.headers, vec!["Name", "Column B", "Column C"]);
    }

    #[test]
    fn text_blob_contains_every_cell() {
        let bytes = workbook_bytes(&[&["Disciplina", "CH"], &["Cálculo I", "80"]]);
        let text = extract_text(&doc(bytes)).unwrap();
        assert_eq!(text, "Disciplina CH\nCálculo I 80");
    }

    #[test]
    fn empty_workbook_has_no_header() {
        let bytes = workbook_bytes(&[]);
        assert!(matches!(load_matrix(&doc(bytes)), Err(IoError::EmptySheet(_))));
    }

    #[test]
    fn non_spreadsheet_rejected() {
        let document = RawDocument::new("h.pdf", DocumentFormat::Pdf, vec![]);
        assert!(matches!(
            load_matrix(&document),
            Err(IoError::NotASpreadsheet { .. })
        ));
    }

    #[test]
    fn corrupt_workbook_is_an_error() {
        let err = load_matrix(&doc(b"PK\x03\x04 not really a zip".to_vec())).unwrap_err();
        assert!(matches!(err, IoError::Workbook { .. }));
    }

    #[test]
    fn load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.xlsx");
        std::fs::write(&path, workbook_bytes(&[&["Name"], &["Calculus I"]])).unwrap();
        let matrix = load_matrix_path(&path).unwrap();
        assert_eq!(matrix.rows.len(), 1);
    }

    #[test]
    fn float_cells_render_without_trailing_zero() {
        assert_eq!(cell_to_string(&Data::Float(60.0)), "60");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(27), "AB");
    }
}
