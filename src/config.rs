use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub ui: UiKind,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UiKind {
    #[default]
    Terminal,
    Zenity,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_memory_percent")]
    pub memory_percent: u8,
    #[serde(default = "default_cpu_percent")]
    pub cpu_percent: u8,
    #[serde(default = "default_temperature_celsius")]
    pub temperature_celsius: f64,
    #[serde(default = "default_disk_percent")]
    pub disk_percent: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Mount point whose usage feeds the disk threshold.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
    #[serde(default = "default_smart_device")]
    pub smart_device: String,
    /// Markdown to HTML converter, invoked as `<renderer> <in.md> -o <out.html>`.
    #[serde(default = "default_renderer")]
    pub renderer: String,
    #[serde(default = "default_browser")]
    pub browser: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            ui: UiKind::default(),
            thresholds: ThresholdsConfig::default(),
            tools: ToolsConfig::default(),
            watch_interval_secs: default_watch_interval_secs(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            memory_percent: default_memory_percent(),
            cpu_percent: default_cpu_percent(),
            temperature_celsius: default_temperature_celsius(),
            disk_percent: default_disk_percent(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            disk_mount: default_disk_mount(),
            smart_device: default_smart_device(),
            renderer: default_renderer(),
            browser: default_browser(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg = Self::load_from_str(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path_display,
                source,
            },
            other => other,
        })?;
        Ok(cfg)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        let cfg: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "log_dir must not be empty".to_string(),
            ));
        }
        if self.watch_interval_secs < 1 {
            return Err(ConfigError::Validation(
                "watch_interval_secs must be >= 1".to_string(),
            ));
        }

        validate_thresholds(&self.thresholds)?;
        validate_tools(&self.tools)?;

        Ok(())
    }

    pub fn monitoring_log(&self) -> PathBuf {
        self.log_dir.join("monitoring.log")
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_thresholds(cfg: &ThresholdsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("memory_percent", cfg.memory_percent),
        ("cpu_percent", cfg.cpu_percent),
        ("disk_percent", cfg.disk_percent),
    ] {
        if value > 100 {
            return Err(ConfigError::Validation(format!(
                "thresholds.{name} must be in range 0..100"
            )));
        }
    }
    if !cfg.temperature_celsius.is_finite() || cfg.temperature_celsius <= 0.0 {
        return Err(ConfigError::Validation(
            "thresholds.temperature_celsius must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_tools(cfg: &ToolsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("disk_mount", &cfg.disk_mount),
        ("smart_device", &cfg.smart_device),
        ("renderer", &cfg.renderer),
        ("browser", &cfg.browser),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "tools.{name} must not be empty"
            )));
        }
    }
    Ok(())
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./system_logs")
}

const fn default_watch_interval_secs() -> u64 {
    300
}

const fn default_memory_percent() -> u8 {
    80
}

const fn default_cpu_percent() -> u8 {
    90
}

const fn default_temperature_celsius() -> f64 {
    80.0
}

const fn default_disk_percent() -> u8 {
    90
}

fn default_disk_mount() -> String {
    "/".to_string()
}

fn default_smart_device() -> String {
    "/dev/sda".to_string()
}

fn default_renderer() -> String {
    "pandoc".to_string()
}

fn default_browser() -> String {
    "xdg-open".to_string()
}
