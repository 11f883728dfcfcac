use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {message}")]
    Io { path: String, message: String },
    #[error("invalid settings in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("setting '{field}' {message}")]
    Invalid { field: &'static str, message: String },
}
