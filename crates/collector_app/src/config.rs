//! Host configuration, read from a RON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use collector_engine::{EngineConfig, DEFAULT_COMMAND_MARKER, PACKAGES_STORAGE_KEY};
use log::LevelFilter;
use serde::Deserialize;

use crate::logging::LogDestination;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the package blob.
    pub data_dir: PathBuf,
    pub log_destination: LogDestination,
    /// Any `log::LevelFilter` name, case-insensitive.
    pub log_level: String,
    pub log_file: PathBuf,
    pub storage_key: String,
    pub command_marker: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./collector_data"),
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
            log_file: PathBuf::from("./collector.log"),
            storage_key: PACKAGES_STORAGE_KEY.to_string(),
            command_marker: DEFAULT_COMMAND_MARKER.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .with_context(|| format!("failed to parse config {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read config {}", path.display()))
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .ok()
            .with_context(|| format!("unknown log level {:?}", self.log_level))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            storage_key: self.storage_key.clone(),
            command_marker: self.command_marker.clone(),
            ..EngineConfig::default()
        }
    }
}
