// AI configuration and credential resolution
//
// The API key comes from, in order:
// 1. An explicit override (the --api-key flag)
// 2. The CREDITMAP_<PROVIDER>_KEY environment variable
//
// Keys are NEVER stored in settings.json

use std::env;
use std::fmt;
use std::time::Duration;

use crate::settings::{AIProvider, AISettings, Settings, DEFAULT_MAX_INPUT_CHARS};

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Passed on the command line
    Argument,
    /// Environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Argument => "argument",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Environment variable holding the key for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("CREDITMAP_{}_KEY", provider.to_uppercase())
}

fn lookup_key(
    provider: &str,
    key_override: Option<&str>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> (Option<String>, KeySource) {
    if let Some(key) = key_override.map(str::trim).filter(|k| !k.is_empty()) {
        return (Some(key.to_string()), KeySource::Argument);
    }
    match env_lookup(&env_var_name(provider)) {
        Some(key) if !key.trim().is_empty() => (Some(key.trim().to_string()), KeySource::Environment),
        _ => (None, KeySource::None),
    }
}

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// Provider is `none`
    Disabled,
    Ready,
    /// Provider is configured but no API key was found
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// The effective AI configuration, fully resolved from settings, flags and
/// environment. Everything that talks to the inference service reads this.
#[derive(Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub max_input_chars: usize,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

// API key is redacted.
impl fmt::Debug for ResolvedAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAIConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("max_input_chars", &self.max_input_chars)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("key_source", &self.key_source)
            .field("status", &self.status)
            .field("blocking_reason", &self.blocking_reason)
            .finish()
    }
}

impl ResolvedAIConfig {
    /// Resolve the effective configuration. `key_override` wins over the
    /// environment.
    pub fn resolve(settings: &AISettings, key_override: Option<&str>) -> Self {
        Self::resolve_with(settings, key_override, |name| env::var(name).ok())
    }

    fn resolve_with(
        settings: &AISettings,
        key_override: Option<&str>,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let provider = settings.provider;
        let base = Self {
            provider,
            model: settings.effective_model().to_string(),
            base_url: settings.effective_base_url().to_string(),
            temperature: settings.temperature,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            max_input_chars: settings.max_input_chars.min(DEFAULT_MAX_INPUT_CHARS),
            api_key: None,
            key_source: KeySource::None,
            status: AIConfigStatus::Disabled,
            blocking_reason: None,
        };

        if !provider.is_enabled() {
            return Self {
                blocking_reason: Some("AI provider is set to \"none\" in settings".to_string()),
                ..base
            };
        }

        let (api_key, key_source) = lookup_key(provider.name(), key_override, env_lookup);
        let (status, blocking_reason) = if api_key.is_some() {
            (AIConfigStatus::Ready, None)
        } else {
            (
                AIConfigStatus::MissingKey,
                Some(format!(
                    "No API key found. Pass --api-key or set {}",
                    env_var_name(provider.name())
                )),
            )
        };

        Self {
            api_key,
            key_source,
            status,
            blocking_reason,
            ..base
        }
    }

    /// Replace the model, e.g. from a `--model` flag.
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
            self.model = model.to_string();
        }
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

// ============================================================================
// Diagnostics (for `creditmap ai doctor`)
// ============================================================================

#[derive(Debug, Clone, serde::Serialize)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub status: &'static str,
    pub key_present: bool,
    pub key_source: &'static str,
    pub key_env_var: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_input_chars: usize,
    pub settings_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_reason: Option<String>,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: config.provider_name().to_string(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            status: config.status.as_str(),
            key_present: config.api_key.is_some(),
            key_source: config.key_source.as_str(),
            key_env_var: env_var_name(config.provider_name()),
            temperature: config.temperature,
            request_timeout_secs: config.request_timeout.as_secs(),
            max_input_chars: config.max_input_chars,
            settings_path: Settings::config_path_display(),
            blocking_reason: config.blocking_reason.clone(),
        }
    }
}

impl fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:          {}", self.provider)?;
        writeln!(f, "Status:            {}", self.status)?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "Base URL:          {}", self.base_url)?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source)?;
        writeln!(f, "Key variable:      {}", self.key_env_var)?;
        writeln!(f, "Temperature:       {}", self.temperature)?;
        writeln!(f, "Timeout:           {}s", self.request_timeout_secs)?;
        writeln!(f, "Max input chars:   {}", self.max_input_chars)?;
        writeln!(f, "Settings file:     {}", self.settings_path)?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Blocked:           {}", reason)?;
        }
        Ok(())
    }
}
