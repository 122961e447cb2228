//! Configuration module for tidyblocks-rs
//!
//! Settings live in a TOML file. The binary reads it from `--config` when
//! given, otherwise from the platform data directory:
//!
//! - **Linux**: `~/.local/share/tidyblocks-rs/settings.toml`
//! - **macOS**: `~/Library/Application Support/tidyblocks-rs/settings.toml`
//! - **Windows**: `%APPDATA%\tidyblocks-rs\settings.toml`
//!
//! A missing file is not an error; every field has a default.
//!
//! # Example
//!
//! ```ignore
//! use tidyblocks_rs::config::Settings;
//!
//! let settings = Settings::load_or_default(&Settings::default_path().unwrap());
//! let scheduler = Scheduler::from_settings(&settings);
//! ```

pub mod settings;

pub use settings::*;

use std::path::PathBuf;

/// Application identifier for data directories
pub const APP_ID: &str = "tidyblocks-rs";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Default tracing filter when neither settings nor `RUST_LOG` give one
pub const DEFAULT_LOG_FILTER: &str = "info,tidyblocks_rs=debug";

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

