use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{provider::SourceId, settings::AppSettings};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Credentials for a single data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source serving the primary channel, e.g. "openmeteo" or "openweather".
    /// Open-Meteo is used when unset.
    pub primary_source: Option<String>,

    /// Per-request HTTP timeout for the remote sources.
    pub request_timeout_secs: u64,

    /// Example TOML:
    /// [sources.openweather]
    /// api_key = "..."
    pub sources: HashMap<String, SourceConfig>,

    /// Settings the dashboard starts with. Changes made while running are
    /// not written back.
    pub settings: AppSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_source: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            sources: HashMap::new(),
            settings: AppSettings::default(),
        }
    }
}

impl Config {
    /// Return the primary source as a strongly-typed SourceId.
    pub fn primary_source_id(&self) -> Result<SourceId> {
        match &self.primary_source {
            Some(s) => SourceId::try_from(s.as_str()),
            None => Ok(SourceId::OpenMeteo),
        }
    }

    pub fn set_primary_source(&mut self, id: SourceId) {
        self.primary_source = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a source API key. The first keyed source also becomes primary.
    pub fn upsert_source_api_key(&mut self, id: SourceId, api_key: String) {
        self.sources
            .insert(id.as_str().to_string(), SourceConfig { api_key });

        if self.primary_source.is_none() {
            self.primary_source = Some(id.to_string());
        }
    }

    /// Returns API key for a source, if present.
    pub fn source_api_key(&self, id: SourceId) -> Option<&str> {
        self.sources
            .get(id.as_str())
            .map(|cfg| cfg.api_key.as_str())
    }

    /// A source is usable once it has whatever credentials it needs.
    pub fn is_source_configured(&self, id: SourceId) -> bool {
        !id.requires_api_key() || self.source_api_key(id).is_some()
    }
}
