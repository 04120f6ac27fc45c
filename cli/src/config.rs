//! Configuration loading and precedence.
//!
//! Values come from command-line flags (which clap also fills from
//! `PORTAL_*` environment variables), then an optional `portal.toml`, then
//! built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const CONFIG_FILENAME: &str = "portal.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Contents of `portal.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub token_file: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub token_file: PathBuf,
}

/// Overrides taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Load the config file (explicit path, or `./portal.toml` if present)
    /// and resolve it against `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => load_file(path)?,
            None => {
                let local = Path::new(CONFIG_FILENAME);
                if local.exists() {
                    load_file(local)?
                } else {
                    FileConfig::default()
                }
            }
        };
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::resolve(file, overrides, home.as_deref())
    }

    pub fn resolve(file: FileConfig, overrides: Overrides, home: Option<&Path>) -> Result<Self> {
        let base_url = overrides
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_base_url(&base_url)?;

        let token_file = overrides
            .token_file
            .or(file.token_file)
            .unwrap_or_else(|| default_token_file(home));

        Ok(Self {
            base_url,
            token_file,
        })
    }
}

/// Load configuration from a specific path
pub fn load_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn default_token_file(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => home.join(".portal").join("token"),
        None => PathBuf::from(".portal-token"),
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| ConfigError::Invalid(format!("base_url '{base_url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "base_url '{base_url}' must use http or https, not {other}"
        ))),
    }
}
