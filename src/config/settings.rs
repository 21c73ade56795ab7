use crate::error::{Error, Result};
use crate::logging::{parse_level, LogConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up by [`Settings::discover`]
pub const SETTINGS_FILE: &str = "typed-ffi.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub spans: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Directories searched before the system loader, in order
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            json: false,
            spans: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl LoggingSettings {
    /// Logging configuration; an unknown level name is a configuration error
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let level = parse_level(&self.level)
            .ok_or_else(|| Error::Config(format!("unknown log level '{}'", self.level)))?;
        Ok(LogConfig {
            level,
            log_path: self.file.clone(),
            json_format: self.json,
            show_spans: self.spans,
        })
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse settings from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse settings: {}", e)))
    }

    /// Find `typed-ffi.toml` in the current directory or its parents
    pub fn discover() -> Self {
        std::env::current_dir()
            .ok()
            .and_then(|dir| Self::discover_from(&dir))
            .unwrap_or_default()
    }

    /// Walk up from `start` to the first readable settings file
    pub fn discover_from(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .map(|dir| dir.join(SETTINGS_FILE))
            .filter(|path| path.exists())
            .find_map(|path| Self::load(&path).ok())
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize settings: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Install the configured logging subscriber
    pub fn init_logging(&self) -> Result<()> {
        crate::logging::init_with_config(self.logging.to_log_config()?);
        Ok(())
    }
}
