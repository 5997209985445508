use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::generator::DEFAULT_LENGTH;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub const SERVER_URL_ENV: &str = "ABSCONDITUS_SERVER_URL";
pub const TIMEOUT_MS_ENV: &str = "ABSCONDITUS_TIMEOUT_MS";
pub const PASSWORD_LENGTH_ENV: &str = "ABSCONDITUS_PASSWORD_LENGTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the local vault server.
    pub server_url: String,
    /// Per-request timeout applied to every vault server call.
    pub timeout_ms: u64,
    /// Length used when a command generates a password without an explicit length.
    pub password_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            password_length: DEFAULT_LENGTH,
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Failed to find config directory")?
            .join("absconditus");
        Ok(dir.join("config.json"))
    }

    /// Config file (if any) with environment overrides applied.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default().normalized());
        }

        let content = fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ClientConfig = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Applies `ABSCONDITUS_*` overrides fetched through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SERVER_URL_ENV) {
            self.set_server_url(&url);
        }
        if let Some(raw) = lookup(TIMEOUT_MS_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => warn!(value = %raw, "ignoring invalid {TIMEOUT_MS_ENV}"),
            }
        }
        if let Some(raw) = lookup(PASSWORD_LENGTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(len) => self.password_length = len,
                Err(_) => warn!(value = %raw, "ignoring invalid {PASSWORD_LENGTH_ENV}"),
            }
        }
    }

    pub fn set_server_url(&mut self, url: &str) {
        self.server_url = url.to_string();
        let normalized = std::mem::take(self).normalized();
        *self = normalized;
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.server_url.trim().trim_end_matches('/');
        self.server_url = if trimmed.is_empty() {
            DEFAULT_SERVER_URL.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }
}
