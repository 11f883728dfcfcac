// File I/O: turn uploaded documents into text and curriculum rows

pub mod error;
pub mod extract;
pub mod pdf;
pub mod xlsx;

pub use error::IoError;
pub use extract::{extract, extract_path};
pub use xlsx::{load_matrix, load_matrix_path};
