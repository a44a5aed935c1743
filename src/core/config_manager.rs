// src/core/config_manager.rs
//! Unified configuration: defaults, then config.yaml, then environment variables

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::service_client::{DEFAULT_BATCH_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use crate::types::Provider;

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_OUTPUT_DIR: &str = "out";
const DEFAULT_LOG_FILE: &str = "/tmp/resume-tailor.log";

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigManager {
    pub environment: String,
    pub service: ServiceConfig,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub api_base: String,
    pub timeout_seconds: u64,
    pub batch_timeout_seconds: u64,
    pub provider: Provider,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_seconds)
    }
}

/// One environment section of config.yaml; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileSection {
    api_base: Option<String>,
    timeout_seconds: Option<u64>,
    batch_timeout_seconds: Option<u64>,
    provider: Option<String>,
    output_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<FileSection>,
    #[serde(default)]
    production: Option<FileSection>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            service: ServiceConfig {
                api_base: DEFAULT_API_BASE.to_string(),
                timeout_seconds: DEFAULT_TIMEOUT_SECS,
                batch_timeout_seconds: DEFAULT_BATCH_TIMEOUT_SECS,
                provider: Provider::default(),
            },
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ConfigManager {
    /// Load from the process environment and ./config.yaml when present
    pub fn load() -> Result<Self> {
        let yaml = if Path::new(CONFIG_FILE).exists() {
            Some(std::fs::read_to_string(CONFIG_FILE).context("Failed to read config.yaml")?)
        } else {
            None
        };

        Self::load_from(|key| std::env::var(key).ok(), yaml.as_deref())
    }

    /// Resolve configuration from an env lookup and optional YAML text
    pub fn load_from<F>(env: F, yaml: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.environment = env("RESUME_TAILOR_ENV")
            .or_else(|| env("ENVIRONMENT"))
            .unwrap_or_else(|| "local".to_string());
        info!("Loading configuration for environment: {}", config.environment);

        if let Some(yaml) = yaml {
            let file: ConfigFile =
                serde_yaml::from_str(yaml).context("Failed to parse config.yaml")?;
            let section = match config.environment.as_str() {
                "production" => file.production,
                _ => file.local,
            };
            if let Some(section) = section {
                config.apply_section(section)?;
            }
        }

        if let Some(api_base) = env("RESUME_TAILOR_API_BASE") {
            config.service.api_base = api_base;
        }
        if let Some(value) = env("RESUME_TAILOR_TIMEOUT_SECS") {
            config.service.timeout_seconds = parse_secs("RESUME_TAILOR_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = env("RESUME_TAILOR_BATCH_TIMEOUT_SECS") {
            config.service.batch_timeout_seconds =
                parse_secs("RESUME_TAILOR_BATCH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = env("RESUME_TAILOR_PROVIDER") {
            config.service.provider = parse_provider(&value)?;
        }
        if let Some(dir) = env("RESUME_TAILOR_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(file) = env("RESUME_TAILOR_LOG_FILE") {
            config.log_file = PathBuf::from(file);
        }

        Ok(config)
    }

    fn apply_section(&mut self, section: FileSection) -> Result<()> {
        if let Some(api_base) = section.api_base {
            self.service.api_base = api_base;
        }
        if let Some(secs) = section.timeout_seconds {
            self.service.timeout_seconds = secs;
        }
        if let Some(secs) = section.batch_timeout_seconds {
            self.service.batch_timeout_seconds = secs;
        }
        if let Some(provider) = section.provider {
            self.service.provider = parse_provider(&provider)?;
        }
        if let Some(dir) = section.output_dir {
            self.output_dir = dir;
        }
        if let Some(file) = section.log_file {
            self.log_file = file;
        }
        Ok(())
    }

    /// Ensure the output directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        use crate::core::FsOps;

        FsOps::ensure_dir_exists(&self.output_dir).await
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, value))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(secs)
}

fn parse_provider(value: &str) -> Result<Provider> {
    Provider::parse(value)
        .ok_or_else(|| anyhow::anyhow!("Unknown provider '{}'. Use local or remote", value))
}
