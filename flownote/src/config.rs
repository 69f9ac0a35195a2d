//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `--config <file>`, else `$XDG_CONFIG_HOME/flownote/flownote.toml`
//! 3. Environment variables: `FLOWNOTE_*` prefix
//!
//! Settings are loaded once in `main` and handed to the services; nothing
//! reads the environment afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Default endpoint of the flownote API.
pub const DEFAULT_API_URL: &str = "https://api.flownote.ai/graphql";

/// Unified configuration for flownote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// GraphQL endpoint of the remote API
    pub api_url: String,
    /// Bearer token for the remote API
    pub api_token: Option<String>,
    /// Branch used by `pull` and as the default `checkout` target
    pub main_branch: String,
    /// Remote name used for both git and dvc
    pub remote: String,
    /// Directory holding per-datasource credential overrides (`<id>.json`)
    pub credentials_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            main_branch: "master".to_string(),
            remote: "origin".to_string(),
            credentials_dir: default_credentials_dir(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub main_branch: Option<String>,
    pub remote: Option<String>,
    pub credentials_dir: Option<PathBuf>,
}

fn default_credentials_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".flownote").join("datasources"))
        .unwrap_or_else(|| PathBuf::from("~/.flownote/datasources"))
}

/// Get the XDG config directory for flownote.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flownote").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flownote.toml"))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            api_url: overlay.api_url.clone().unwrap_or_else(|| self.api_url.clone()),
            api_token: overlay.api_token.clone().or_else(|| self.api_token.clone()),
            main_branch: overlay
                .main_branch
                .clone()
                .unwrap_or_else(|| self.main_branch.clone()),
            remote: overlay.remote.clone().unwrap_or_else(|| self.remote.clone()),
            credentials_dir: overlay
                .credentials_dir
                .clone()
                .unwrap_or_else(|| self.credentials_dir.clone()),
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.credentials_dir.to_string_lossy().as_ref());
        self.credentials_dir = PathBuf::from(expanded);
    }

    /// Load settings with layered precedence from the process environment.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; when `None` the global file is used if present
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_env(config_file, None)
    }

    /// Load settings, reading `FLOWNOTE_*` variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file (explicit one must exist)
        match config_file {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        let raw = load_raw_settings(&global_path)?;
                        current = current.merge_with(&raw);
                    }
                }
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current, env)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply FLOWNOTE_* environment variables as explicit overrides.
    fn apply_env_overrides(
        settings: Self,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("FLOWNOTE").source(env))
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            api_url: config.get_string("api_url").ok(),
            api_token: config.get_string("api_token").ok(),
            main_branch: config.get_string("main_branch").ok(),
            remote: config.get_string("remote").ok(),
            credentials_dir: config.get_string("credentials_dir").ok().map(PathBuf::from),
        };
        Ok(settings.merge_with(&raw))
    }

    /// Render as TOML (token redacted).
    pub fn to_toml_redacted(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.api_token.is_some() {
            shown.api_token = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}
