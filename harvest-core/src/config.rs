//! Configuration management for harvest
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (HARVEST_*)
//! 3. Config file (~/.config/harvest/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default GitHub GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// GitHub API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GraphQL endpoint URL
    pub api_url: String,

    /// How many times a transport failure is retried before giving up
    pub max_retries: u32,

    /// Delay before the first retry; doubles on every further attempt
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Harvest loop settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Flush the accumulated discussions to disk every N pages
    pub flush_every_pages: u32,

    /// Repository list file: a header line, then `<owner> <name>` per line
    pub repositories_file: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            flush_every_pages: 10,
            repositories_file: PathBuf::from("resources/repositories.txt"),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the raw JSON records, one folder per repository
    pub raw_root: PathBuf,

    /// Where exported `<repo>.txt` files are written
    pub transformed_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_root: PathBuf::from("data/raw"),
            transformed_root: PathBuf::from("data/transformed"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API configuration
    pub github: GitHubConfig,

    /// Harvest loop configuration
    pub harvest: HarvestConfig,

    /// Output locations
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/harvest/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("harvest").join("config.toml"))
    }

    /// Reject values the harvester cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.harvest.flush_every_pages == 0 {
            return Err(Error::Config(
                "harvest.flush_every_pages must be > 0".to_string(),
            ));
        }
        if self.github.api_url.trim().is_empty() {
            return Err(Error::Config("github.api_url must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - HARVEST_API_URL: GraphQL endpoint
    /// - HARVEST_RAW_ROOT: Root folder of raw records
    /// - HARVEST_TRANSFORMED_ROOT: Output folder of exported text files
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api_url) = lookup("HARVEST_API_URL") {
            self.github.api_url = api_url;
        }

        if let Some(raw_root) = lookup("HARVEST_RAW_ROOT") {
            self.storage.raw_root = PathBuf::from(raw_root);
        }

        if let Some(transformed_root) = lookup("HARVEST_TRANSFORMED_ROOT") {
            self.storage.transformed_root = PathBuf::from(transformed_root);
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        raw_root: Option<PathBuf>,
        repositories_file: Option<PathBuf>,
    ) -> Self {
        if let Some(root) = raw_root {
            self.storage.raw_root = root;
        }

        if let Some(file) = repositories_file {
            self.harvest.repositories_file = file;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults. An explicit `config_file`
    /// replaces the default location and must exist.
    pub fn load_with_overrides(
        config_file: Option<&Path>,
        raw_root: Option<PathBuf>,
        repositories_file: Option<PathBuf>,
    ) -> Result<Self> {
        let base = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        let config = base
            .with_env_overrides()
            .with_cli_overrides(raw_root, repositories_file);
        config.validate()?;
        Ok(config)
    }
}
