//! Secrets management for harvest
//!
//! The API token is kept out of `config.toml` so the config can be shared.
//! The secrets file is located at `~/.config/harvest/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_API_TOKEN, then GITHUB_TOKEN)
//! 2. Secrets file (~/.config/harvest/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variables consulted for the token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_API_TOKEN", "GITHUB_TOKEN"];

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub configuration
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// GitHub Personal Access Token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut token) = secrets.github.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/harvest/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("harvest").join("secrets.toml"))
    }

    /// Get GitHub token with environment variable override
    pub fn github_token(&self) -> Option<String> {
        Self::token_from(|name| std::env::var(name).ok(), self.github.token.as_deref())
    }

    /// Like [`Secrets::github_token`], but a missing token is an error
    pub fn require_github_token(&self) -> Result<String> {
        self.github_token()
            .ok_or_else(|| Error::MissingToken(TOKEN_ENV_VARS.join(" or ")))
    }

    fn token_from(
        lookup: impl Fn(&str) -> Option<String>,
        file_token: Option<&str>,
    ) -> Option<String> {
        for name in TOKEN_ENV_VARS {
            if let Some(token) = lookup(name) {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    debug!(var = name, "Using GitHub token from environment");
                    return Some(token);
                }
            }
        }

        match file_token {
            Some(token) if !token.is_empty() => {
                debug!("Using GitHub token from secrets file");
                Some(token.to_string())
            }
            _ => None,
        }
    }
}
