//! Loading and saving settings files

use std::path::{Path, PathBuf};

use tracing::{debug, debug_span, instrument};

use crate::error::{ConfigError, ConfigResult};
use crate::tracing::span_names;

use super::settings::BoardSettings;

/// Name of the application's configuration directory
pub const CONFIG_DIR_NAME: &str = "boardrank";

/// File name of the settings file inside the configuration directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Reads and writes `settings.toml` in a configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the user's default configuration directory
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if the platform has no config dir.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join(CONFIG_DIR_NAME)))
    }

    /// Creates a manager for an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings, returning defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// holds invalid values.
    pub fn load_settings(&self) -> ConfigResult<BoardSettings> {
        let path = self.settings_path();
        let _span = debug_span!(span_names::CONFIG_LOAD, path = %path.display()).entered();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file, using defaults");
                return Ok(BoardSettings::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let settings: BoardSettings = toml::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    #[instrument(skip(self, settings), fields(path = %self.settings_path().display()))]
    pub fn save_settings(&self, settings: &BoardSettings) -> ConfigResult<()> {
        settings.validate()?;
        std::fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;
        let text = toml::to_string_pretty(settings)?;
        let path = self.settings_path();
        std::fs::write(&path, text).map_err(|source| ConfigError::Io { path, source })?;
        debug!("Settings saved");
        Ok(())
    }
}
