//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// TOML-backed file configuration for newsfeed defaults.
///
/// Every field is optional; command-line values win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Live query endpoint.
    pub query_endpoint: Option<String>,
    /// Default repair budget for malformed responses.
    pub max_repair_attempts: Option<u32>,
    /// Default article search window in minutes.
    pub window_minutes: Option<u32>,
    /// Query a final window shorter than the window length.
    pub include_trailing_partial: Option<bool>,
    /// Archives downloaded at once.
    pub concurrency: Option<usize>,
    /// Pause before each archive request, in milliseconds.
    pub throttle_ms: Option<u64>,
    /// Proxy URL for archive requests.
    pub proxy: Option<String>,
    /// Base URL override for the selected archive family.
    pub archive_base_url: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP total request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(window) = self.window_minutes
            && window == 0
        {
            bail!("Invalid config value for `window_minutes`: 0. Expected at least 1");
        }

        if let Some(concurrency) = self.concurrency
            && !(1..=512).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=512");
        }

        if let Some(throttle) = self.throttle_ms
            && throttle > 60_000
        {
            bail!("Invalid config value for `throttle_ms`: {throttle}. Expected range: 0..=60000");
        }

        validate_url("query_endpoint", self.query_endpoint.as_deref())?;
        validate_url("archive_base_url", self.archive_base_url.as_deref())?;
        validate_url("proxy", self.proxy.as_deref())?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        Ok(())
    }
}

fn validate_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    url::Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}' is not a URL"))?;
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/newsfeed/config.toml`
/// 2. `$HOME/.config/newsfeed/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("newsfeed")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("newsfeed")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}
