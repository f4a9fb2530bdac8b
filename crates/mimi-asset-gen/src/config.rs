//! Layered configuration system
//!
//! Config is loaded with four layers of precedence (highest wins):
//! 1. Explicit values passed by the caller (CLI flags)
//! 2. Environment variables: `MIMIAI_API_KEY`, `MIMIAI_API_URL`
//! 3. Project-local: `.mimi/config.toml`
//! 4. Global: `~/.mimi/config.toml`

use mimi_core::{MimiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::stream::ErrorPolicy;

pub const DEFAULT_API_URL: &str = "https://mimiaigen--physical-data-agent-api.modal.run";
pub const API_KEY_ENV: &str = "MIMIAI_API_KEY";
pub const API_URL_ENV: &str = "MIMIAI_API_URL";

/// Prompt used when neither the caller nor a config file supplies one.
/// `{TARGET}` is substituted server-side.
pub const DEFAULT_PROMPT: &str = "Generate {TARGET} in different styles, make realistic variations, \
no ground, no tool, not toy, only realistic {TARGET}";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Service connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Whole-request timeout for job submission
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout for the progress stream (the stream itself has none)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

/// Generation defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub stop_on_error: Option<bool>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MimiConfigFile {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct MimiConfig {
    pub api: ApiConfig,
    pub generation: GenerationConfig,
}

impl MimiConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = MimiConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".mimi/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        Ok(MimiConfig {
            api: config.api,
            generation: config.generation,
        })
    }

    /// Load config from a specific file path only, then apply env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(MimiConfig {
            api: config.api,
            generation: config.generation,
        })
    }

    /// Resolve the credential: an explicit key wins over env/config.
    /// Empty strings count as absent.
    pub fn api_key(&self, explicit: Option<&str>) -> Option<String> {
        non_empty(explicit)
            .or_else(|| non_empty(self.api.api_key.as_deref()))
            .map(str::to_string)
    }

    /// Like [`MimiConfig::api_key`], but a missing credential is an error.
    /// Only starting a new job needs one.
    pub fn require_api_key(&self, explicit: Option<&str>) -> Result<String> {
        self.api_key(explicit).ok_or_else(|| {
            MimiError::Configuration(format!(
                "an API key is required when starting a new job. Set {} or pass --api-key",
                API_KEY_ENV
            ))
        })
    }

    /// Service base URL without a trailing slash
    pub fn api_url(&self, explicit: Option<&str>) -> String {
        non_empty(explicit)
            .or_else(|| non_empty(self.api.api_url.as_deref()))
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn prompt(&self, explicit: Option<&str>) -> String {
        non_empty(explicit)
            .or_else(|| non_empty(self.generation.prompt.as_deref()))
            .unwrap_or(DEFAULT_PROMPT)
            .to_string()
    }

    pub fn batch_size(&self, explicit: Option<u32>) -> u32 {
        explicit.or(self.generation.batch_size).unwrap_or(1)
    }

    /// What the stream consumer does with server-reported error events
    pub fn error_policy(&self, stop_on_error_flag: bool) -> ErrorPolicy {
        if stop_on_error_flag || self.generation.stop_on_error.unwrap_or(false) {
            ErrorPolicy::Stop
        } else {
            ErrorPolicy::Continue
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".mimi").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<MimiConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: MimiConfigFile = toml::from_str(&content).map_err(|e| {
            MimiError::Configuration(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut MimiConfigFile, overlay: MimiConfigFile) {
        if overlay.api.api_key.is_some() {
            base.api.api_key = overlay.api.api_key;
        }
        if overlay.api.api_url.is_some() {
            base.api.api_url = overlay.api.api_url;
        }
        if overlay.api.request_timeout_secs.is_some() {
            base.api.request_timeout_secs = overlay.api.request_timeout_secs;
        }
        if overlay.api.connect_timeout_secs.is_some() {
            base.api.connect_timeout_secs = overlay.api.connect_timeout_secs;
        }
        if overlay.generation.prompt.is_some() {
            base.generation.prompt = overlay.generation.prompt;
        }
        if overlay.generation.batch_size.is_some() {
            base.generation.batch_size = overlay.generation.batch_size;
        }
        if overlay.generation.stop_on_error.is_some() {
            base.generation.stop_on_error = overlay.generation.stop_on_error;
        }
    }

    fn apply_env_overrides<F>(config: &mut MimiConfigFile, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            config.api.api_key = Some(key);
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.is_empty()) {
            config.api.api_url = Some(url);
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
