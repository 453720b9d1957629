//! Persistent application configuration
//!
//! Stores the refresh interval, tray appearance and window preferences in a
//! JSON file at `%APPDATA%/displayslots/config.json` (Windows) or equivalent.

use displayslots_core::{RefreshInterval, RefresherError, TrayConfig, TrayImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_refresh_interval_ms() -> u64 {
    displayslots_core::DEFAULT_REFRESH_INTERVAL_MS
}

fn default_tray_tooltip() -> String {
    displayslots_core::DEFAULT_TRAY_TOOLTIP.to_string()
}

fn default_minimize_to_tray() -> bool {
    true
}

fn default_slot_count() -> u8 {
    3
}

/// Persistent application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Milliseconds between automatic layout passes
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Tray icon image (None = built-in icon)
    #[serde(default)]
    pub tray_icon_path: Option<PathBuf>,
    /// Tooltip shown on the tray icon
    #[serde(default = "default_tray_tooltip")]
    pub tray_tooltip: String,
    /// Closing the window hides it to the tray instead of exiting
    #[serde(default = "default_minimize_to_tray")]
    pub minimize_to_tray: bool,
    #[serde(default)]
    pub dark_theme: bool,
    /// Number of slots shown in the window
    #[serde(default = "default_slot_count")]
    pub slot_count: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            tray_icon_path: None,
            tray_tooltip: default_tray_tooltip(),
            minimize_to_tray: default_minimize_to_tray(),
            dark_theme: false,
            slot_count: default_slot_count(),
        }
    }
}

impl AppConfig {
    /// Config file path: `<data_dir>/displayslots/config.json`
    pub fn path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("displayslots")
            .join("config.json")
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }

    /// Refresh interval, rejecting zero
    pub fn refresh_interval(&self) -> Result<RefreshInterval, RefresherError> {
        RefreshInterval::from_millis(self.refresh_interval_ms)
    }

    /// Appearance of the tray icon
    pub fn tray_config(&self) -> TrayConfig {
        TrayConfig {
            tooltip: self.tray_tooltip.clone(),
            image: TrayImage::from(self.tray_icon_path.clone()),
            ..TrayConfig::default()
        }
    }
}
