// Application settings
// Loaded from ~/.config/creditmap/settings.json

use creditmap_core::DEFAULT_NAME_HINTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
/// Also the upper bound: settings may lower the per-document budget, never raise it.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 20_000;

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// Inference disabled; `analyze` refuses to run
    None,
    /// Google Generative Language API
    #[default]
    Gemini,
}

impl AIProvider {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Gemini => DEFAULT_GEMINI_BASE_URL,
        }
    }
}

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    pub provider: AIProvider,

    /// Model identifier; empty means the provider default
    pub model: String,

    /// Service root; `None` means the provider default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub temperature: f32,

    pub request_timeout_secs: u64,

    /// Per-document character budget sent to the model
    pub max_input_chars: usize,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::Gemini,
            model: String::new(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl AISettings {
    pub fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            self.model.trim()
        }
    }

    pub fn effective_base_url(&self) -> &str {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/'),
            _ => self.provider.default_base_url(),
        }
    }
}

/// How the course-name column of the curriculum matrix is found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixSettings {
    /// Header substrings tried in order, case-insensitively
    pub name_column_hints: Vec<String>,

    /// Exact header to use instead of the hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_column: Option<String>,
}

impl Default for MatrixSettings {
    fn default() -> Self {
        Self {
            name_column_hints: DEFAULT_NAME_HINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            name_column: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub matrix: MatrixSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("creditmap");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults.
    /// A missing file is created with commented defaults.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = write_default_file(&path) {
                log::warn!("{}", e);
            }
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load and validate settings from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::parse(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings JSON; lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings = serde_json::from_str(&cleaned).map_err(|e| ConfigError::Parse {
            path: "<settings>".to_string(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.ai.temperature;
        if !t.is_finite() || !(0.0..=2.0).contains(&t) {
            return Err(ConfigError::Invalid {
                field: "ai.temperature",
                message: format!("must be between 0 and 2, got {}", t),
            });
        }
        if self.ai.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "ai.request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        let max = self.ai.max_input_chars;
        if max == 0 || max > DEFAULT_MAX_INPUT_CHARS {
            return Err(ConfigError::Invalid {
                field: "ai.max_input_chars",
                message: format!("must be between 1 and {}, got {}", DEFAULT_MAX_INPUT_CHARS, max),
            });
        }
        Ok(())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

const DEFAULT_FILE: &str = r#"{
    // Inference service
    // Provider options: "gemini", "none"
    // The API key is read from --api-key or CREDITMAP_GEMINI_KEY, never from this file
    "ai": {
        "provider": "gemini",
        "model": "",
        "temperature": 0.1,
        "request_timeout_secs": 300,
        "max_input_chars": 20000
    },

    // Curriculum matrix: header substrings that identify the course-name column
    "matrix": {
        "name_column_hints": ["discipline", "disciplina", "name", "nome"]
    }
}
"#;

fn write_default_file(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }
    fs::write(path, DEFAULT_FILE).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
