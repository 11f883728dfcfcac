use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    /// File could not be read from disk.
    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },
    /// Workbook could not be opened or a sheet could not be read.
    #[error("failed to open workbook '{name}': {message}")]
    Workbook { name: String, message: String },
    /// Workbook has no worksheets.
    #[error("workbook '{0}' contains no sheets")]
    NoSheets(String),
    /// First worksheet has no header row.
    #[error("sheet '{0}' is empty")]
    EmptySheet(String),
    /// PDF parser rejected the document.
    #[error("failed to read PDF '{name}': {message}")]
    Pdf { name: String, message: String },
    /// Plain-text document is not valid UTF-8.
    #[error("'{name}' is not valid UTF-8: {message}")]
    Encoding { name: String, message: String },
    /// Document format cannot hold a curriculum matrix.
    #[error("'{name}' is not a spreadsheet (format: {format})")]
    NotASpreadsheet { name: String, format: String },
}
