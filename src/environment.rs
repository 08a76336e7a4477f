// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::reconciler::RetryPolicy;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub services: ServiceConfig,
    pub retry: RetryConfig,
    pub post_write: PostWriteConfig,
    pub server: ServerSettings,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listing_url: String,
    pub status_url: String,
    pub decision_url: String,
    pub timeout_seconds: u64,
}

/// Retry envelope for the status lookups made after a baseline load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Retry envelope for the re-read that follows a decision write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostWriteConfig {
    pub initial_delay_ms: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: ReviewConfig,
    #[serde(default)]
    production: ReviewConfig,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            services: ServiceConfig::default(),
            retry: RetryConfig::default(),
            post_write: PostWriteConfig::default(),
            server: ServerSettings::default(),
            log_path: PathBuf::from("/tmp/talent-review.log"),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listing_url: "http://127.0.0.1:5601".to_string(),
            status_url: "http://127.0.0.1:5602".to_string(),
            decision_url: "http://127.0.0.1:5603".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Default for PostWriteConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_attempts: 5,
            base_delay_ms: 1000,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

impl ReviewConfig {
    /// Load configuration for the current environment.
    ///
    /// `config.yaml` is optional; environment variables override whatever it
    /// (or the defaults) provide.
    pub fn load() -> Result<Self> {
        Self::load_file(Path::new(CONFIG_FILE))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config = Self::load_from(path, &environment)?;
        config.with_overrides(|name| std::env::var(name).ok())
    }

    fn get_environment() -> String {
        std::env::var("REVIEW_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from(path: &Path, environment: &str) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment)
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse configuration")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    /// Apply overrides looked up by variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("JOBS_SERVICE_URL") {
            self.services.listing_url = url;
        }
        if let Some(url) = lookup("STATUS_SERVICE_URL") {
            self.services.status_url = url;
        }
        if let Some(url) = lookup("DECISION_SERVICE_URL") {
            self.services.decision_url = url;
        }
        if let Some(port) = lookup("ROCKET_PORT") {
            self.server.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?;
        }
        if let Some(path) = lookup("REVIEW_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            initial_delay: Duration::ZERO,
        }
    }

    pub fn post_write_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.post_write.max_attempts.max(1),
            base_delay: Duration::from_millis(self.post_write.base_delay_ms),
            initial_delay: Duration::from_millis(self.post_write.initial_delay_ms),
        }
    }
}
