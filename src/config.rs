//! User configuration.
//!
//! Settings come from ~/.config/framewm/config.toml when present; every
//! field has a built-in default, so the file is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub colors: ColorConfig,
}

/// Decoration geometry settings
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Frame border width in pixels
    pub frame_border_width: u16,
    /// Titlebar height in pixels (the client sits below it)
    pub titlebar_height: u16,
    /// Inner border width of the titlebar window
    pub title_inner_border: u16,
    /// Maximum extent of the corner resize zones
    pub corner_grip: u16,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            frame_border_width: 3,
            titlebar_height: 20,
            title_inner_border: 1,
            corner_grip: 40,
        }
    }
}

/// Color settings, as server-resolvable color names
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub desktop_background: String,
    pub window_background: String,
    pub inactive_frame: String,
    pub inactive_title: String,
    pub inactive_title_border: String,
    pub active_frame: String,
    pub active_title: String,
    pub active_title_border: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            desktop_background: "black".to_string(),
            window_background: "white".to_string(),
            inactive_frame: "light slate grey".to_string(),
            inactive_title: "slate grey".to_string(),
            inactive_title_border: "dark slate grey".to_string(),
            active_frame: "dark goldenrod".to_string(),
            active_title: "gold".to_string(),
            active_title_border: "saddle brown".to_string(),
        }
    }
}

impl Config {
    /// Load the user config from ~/.config/framewm/config.toml, falling
    /// back to the built-in defaults when it is absent or unparseable.
    pub fn load() -> Self {
        let path = dirs::config_dir()
            .map(|base| base.join("framewm").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("framewm.toml"));
        Self::load_from_path(&path)
    }

    fn load_from_path(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            log::info!("No config at {}, using built-in defaults", path.display());
            return Self::default();
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                log::info!("Applied config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring unparseable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
