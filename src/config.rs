// Configuration - Load settings from config.toml
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub window: WindowConfig,
    pub debug: DebugConfig,
}

/// Application identity reported to the driver
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// major.minor.patch
    pub version: [u32; 3],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Popgun".to_string(),
            version: [0, 1, 0],
        }
    }
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Popgun".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Enable Vulkan validation layers (effective in debug builds only)
    pub validation_layers: bool,
    /// Also route INFO/VERBOSE driver messages to the log
    pub verbose_messages: bool,
    /// Also receive PERFORMANCE-category driver messages
    pub performance_messages: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            verbose_messages: false,
            performance_messages: false,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.app.name, "Popgun");
        assert_eq!(config.app.version, [0, 1, 0]);
        assert!(config.debug.validation_layers);
        assert!(!config.debug.verbose_messages);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [app]
            name = "BounceBall"

            [debug]
            performance_messages = true
            "#,
        )
        .unwrap();
        assert_eq!(config.app.name, "BounceBall");
        assert_eq!(config.window.width, 1280);
        assert!(config.debug.performance_messages);
        assert!(config.debug.validation_layers);
    }
}
