//! Configuration Management
//!
//! Handles persistent configuration storage for corral.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between power-state polls when waiting
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Corral service endpoint, e.g. "https://corral.example.net"
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Identity service endpoint for password auth
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Pre-issued API token
    #[serde(default)]
    pub token: Option<String>,
    /// Username for password auth
    #[serde(default)]
    pub username: Option<String>,
    /// Default project scope for list operations
    #[serde(default)]
    pub project: Option<String>,
    /// Seconds between polls when waiting on a power-state change
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("corral").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective endpoint (env > config)
    pub fn effective_endpoint(&self) -> Option<String> {
        std::env::var("CORRAL_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.endpoint.clone())
    }

    /// Get effective auth URL (env > config)
    pub fn effective_auth_url(&self) -> Option<String> {
        std::env::var("CORRAL_AUTH_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.auth_url.clone())
    }

    /// Get effective token (env > config)
    pub fn effective_token(&self) -> Option<String> {
        std::env::var("CORRAL_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.token.clone())
    }

    /// Get effective username (env > config)
    pub fn effective_username(&self) -> Option<String> {
        std::env::var("CORRAL_USERNAME")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.username.clone())
    }

    /// Password is never persisted; env only
    pub fn effective_password(&self) -> Option<String> {
        std::env::var("CORRAL_PASSWORD").ok().filter(|s| !s.is_empty())
    }

    /// Get effective project scope (env > config)
    pub fn effective_project(&self) -> Option<String> {
        std::env::var("CORRAL_PROJECT")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.project.clone())
    }

    /// Interval between polls when waiting on a power-state change
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Set endpoint and save
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.endpoint = Some(endpoint.to_string());
        self.save()
    }

    /// Set project and save
    pub fn set_project(&mut self, project: &str) -> Result<()> {
        self.project = Some(project.to_string());
        self.save()
    }
}
