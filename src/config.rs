use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::plugins::ExtensionMapping;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub plugins: PluginsConfig,
    pub monitor: MonitorConfig,
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginsConfig {
    pub directory: PathBuf,
    /// Application identifier -> module file name
    pub mappings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub polling_interval_ms: u64,
    pub execution_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: String,
    pub dry_run_cycle: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("plugins"),
            mappings: BTreeMap::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 1000,
            execution_timeout_ms: None,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            dry_run_cycle: 5,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FOCUS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.monitor.polling_interval_ms < 10 {
            anyhow::bail!("polling_interval_ms must be at least 10");
        }

        if self.monitor.execution_timeout_ms == Some(0) {
            anyhow::bail!("execution_timeout_ms must be greater than 0");
        }

        match self.detector.backend.as_str() {
            "auto" | "kdotool" | "xdotool" | "sway" => {}
            _ => anyhow::bail!("Invalid detector backend: {}", self.detector.backend),
        }

        if self.detector.dry_run_cycle == 0 {
            anyhow::bail!("dry_run_cycle must be greater than 0");
        }

        for (app, module) in &self.plugins.mappings {
            if app.trim().is_empty() {
                anyhow::bail!("Empty application identifier in plugin mappings");
            }
            if module.trim().is_empty() {
                anyhow::bail!("Empty module name mapped to '{}'", app);
            }
        }

        Ok(())
    }

    pub fn extension_mapping(&self) -> ExtensionMapping {
        ExtensionMapping::new(self.plugins.mappings.clone())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.polling_interval_ms)
    }

    pub fn execution_timeout(&self) -> Option<Duration> {
        self.monitor.execution_timeout_ms.map(Duration::from_millis)
    }
}
