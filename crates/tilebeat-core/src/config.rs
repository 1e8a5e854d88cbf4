use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{engine::EngineError, model::DEFAULT_PITCH, timeline::TimelineDefaults};

pub const CONFIG_FILE_NAME: &str = "tilebeat.config.toml";
pub const CONFIG_PATH_ENV: &str = "TILEBEAT_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub timeline: TimelineDefaults,
    pub audio: AudioConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub reference_sample: PathBuf,
    pub default_pitch: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub log_filter: String,
    pub log_file_prefix: String,
    pub log_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            reference_sample: PathBuf::from("hit.wav"),
            default_pitch: DEFAULT_PITCH,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,tilebeat_core=debug".to_string(),
            log_file_prefix: "tilebeat".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AudioConfig {
    /// A relative reference path that does not exist under the working
    /// directory is looked up next to the running executable.
    #[must_use]
    pub fn resolve_reference_sample(&self) -> PathBuf {
        let configured = &self.reference_sample;
        if configured.is_absolute() || configured.is_file() {
            return configured.clone();
        }

        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(configured)))
            .filter(|candidate| candidate.is_file())
            .unwrap_or_else(|| configured.clone())
    }
}

impl AppConfig {
    /// Loads the discovered config file, falling back to defaults when none exists.
    pub fn load() -> Result<Self, EngineError> {
        match discover_config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path).map_err(|error| {
            EngineError::Config(format!(
                "failed to read config file {}: {error}",
                path.display()
            ))
        })?;

        let config = Self::parse(&content).map_err(|error| match error {
            EngineError::Config(message) => {
                EngineError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, EngineError> {
        toml::from_str(content).map_err(|error| EngineError::Config(error.to_string()))
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let cwd = env::current_dir().ok()?;
    [cwd.join(CONFIG_FILE_NAME), cwd.join("..").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.is_file())
}
