//! Configuration management for `BoardRank`
//!
//! This module provides the `ConfigManager` for loading and saving
//! engine settings in TOML format.

mod manager;
mod settings;

pub use manager::{CONFIG_DIR_NAME, ConfigManager, SETTINGS_FILE};
pub use settings::{BoardSettings, LoggingSettings, MIN_MAX_RANK_LEN};
