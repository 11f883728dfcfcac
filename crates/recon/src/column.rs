pub use creditmap_core::DEFAULT_NAME_HINTS;

/// How the course-name column of the matrix is chosen.
///
/// Best effort: a matrix whose name column matches no hint falls back to
/// its first column, which may be wrong (e.g. a period or code column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameColumnStrategy {
    /// First header (left to right) containing any hint, case-insensitively.
    SubstringHints(Vec<String>),
    /// Header equal to this name (trimmed, case-insensitive).
    FixedColumn(String),
}

impl Default for NameColumnStrategy {
    fn default() -> Self {
        Self::SubstringHints(DEFAULT_NAME_HINTS.iter().map(|s| s.to_string()).collect())
    }
}

impl NameColumnStrategy {
    /// Fixed column when one is given, otherwise hints (default hints when
    /// the list is empty).
    pub fn from_parts(fixed: Option<&str>, hints: &[String]) -> Self {
        match fixed.map(str::trim).filter(|f| !f.is_empty()) {
            Some(name) => Self::FixedColumn(name.to_string()),
            None if hints.is_empty() => Self::default(),
            None => Self::SubstringHints(hints.to_vec()),
        }
    }

    /// Index of the name column, or `None` when there are no headers.
    pub fn resolve(&self, headers: &[String]) -> Option<usize> {
        if headers.is_empty() {
            return None;
        }
        let found = match self {
            Self::SubstringHints(hints) => {
                let hints: Vec<String> = hints
                    .iter()
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect();
                headers.iter().position(|header| {
                    let header = header.to_lowercase();
                    hints.iter().any(|hint| header.contains(hint.as_str()))
                })
            }
            Self::FixedColumn(name) => {
                let wanted = name.trim().to_lowercase();
                headers.iter().position(|h| h.trim().to_lowercase() == wanted)
            }
        };
        if found.is_none() {
            log::warn!("no header matched {:?}; using first column '{}'", self, headers[0]);
        }
        Some(found.unwrap_or(0))
    }
}
