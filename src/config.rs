//! LogMonitor configuration types and loading

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main LogMonitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Monitored log files
    pub logs: LogsConfig,

    /// Auth relay configuration
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./logmonitor.yml
        let local_config = PathBuf::from("logmonitor.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/logmonitor/logmonitor.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("logmonitor").join("logmonitor.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP/push surface
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3002".to_string(),
        }
    }
}

/// Monitored log files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Base directory holding the monitored files
    pub dir: PathBuf,

    /// Short names of the files to monitor, resolved against `dir`
    pub files: Vec<String>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/tmp"),
            files: vec![
                "localtunnel.log".to_string(),
                "production.log".to_string(),
                "auth.log".to_string(),
                "nextjs.log".to_string(),
            ],
        }
    }
}

impl LogsConfig {
    /// Absolute paths of the configured files
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| self.dir.join(f)).collect()
    }
}

/// Auth relay configuration
///
/// When enabled, log events from `source-file` matching the auth, error, or
/// api pattern groups are appended as annotated lines to `target-file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub enabled: bool,

    /// Short name of the file whose events are mirrored
    #[serde(rename = "source-file")]
    pub source_file: String,

    /// Short name of the file annotated lines are appended to
    #[serde(rename = "target-file")]
    pub target_file: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_file: "production.log".to_string(),
            target_file: "auth.log".to_string(),
        }
    }
}
