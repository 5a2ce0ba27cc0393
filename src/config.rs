use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "FILE_CONVERTER_CONFIG";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Session-wide settings, read by every file's pipeline.
///
/// ```json
/// { "max_file_size_mb": 25, "full_preview": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Files larger than this (in MiB) are skipped before parsing.
    pub max_file_size_mb: u32,
    /// Show the whole table instead of the first rows.
    pub full_preview: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            full_preview: false,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Settings from the file named by [`CONFIG_ENV`], or the defaults when
    /// the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size_mb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Size in MiB of a file of `bytes` bytes.
    pub fn size_mb(bytes: u64) -> f64 {
        bytes as f64 / BYTES_PER_MB
    }

    pub fn exceeds_limit(&self, bytes: u64) -> bool {
        Self::size_mb(bytes) > f64::from(self.max_file_size_mb)
    }
}
