use anyhow::{Context, Result};
use screennodes::LlmConfig;
use screenruntime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "screen.toml";

/// Settings for the `screen` binary, read from TOML.
///
/// ```toml
/// [model]
/// model = "llama-3.3-70b-versatile"
///
/// [runtime]
/// node_timeout_ms = 60000
/// on_error = "mark_degraded"
///
/// [screening]
/// threshold = 80
///
/// [notify]
/// webhook_url = "https://hooks.example.com/invite"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: LlmConfig,
    pub runtime: RuntimeConfig,
    pub screening: ScreeningConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Minimum score (inclusive) for a candidate to be shortlisted
    pub threshold: u32,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self { threshold: 75 }
    }
}

/// Invitations are posted to `webhook_url` when set, logged otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub recipient: Option<String>,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Read `path` if given, else `screen.toml` in `dir` if present, else
    /// defaults.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            tracing::debug!(path = %fallback.display(), "Using config file");
            return Self::from_file(fallback);
        }

        Ok(Self::default())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}
