// Configuration loading

pub mod ai;
pub mod error;
pub mod settings;

pub use ai::{AIConfigStatus, AIDiagnostics, KeySource, ResolvedAIConfig};
pub use error::ConfigError;
pub use settings::{AIProvider, AISettings, MatrixSettings, Settings};
