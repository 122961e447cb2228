//! User settings
//!
//! # Main Types
//!
//! - [`Settings`] - everything read from `settings.toml`
//! - [`OutputFormat`] - how the binary prints displayed tables

use super::{app_data_dir, DEFAULT_LOG_FILTER, SETTINGS_FILE};
use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the binary renders displayed tables and plot specs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON document per displayed item
    #[default]
    Json,
    /// Human-readable row listing
    Pretty,
}

/// Settings for the scheduler and the binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,

    /// Append a display-only terminator to pipelines that don't end in
    /// `notify` or `plot`
    pub auto_terminate: bool,

    /// Log pipelines still waiting when a run drains its queue
    pub warn_on_stall: bool,

    /// Output rendering for the binary
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            auto_terminate: true,
            warn_on_stall: true,
            output: OutputFormat::default(),
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        app_data_dir().map(|p| p.join(SETTINGS_FILE))
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TidyError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            TidyError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load settings, returning defaults if the file is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings as TOML, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TidyError::Config(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TidyError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            TidyError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}
