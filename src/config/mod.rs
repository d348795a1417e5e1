//! Configuration management for chatfolders.
//!
//! Handles persistence and loading of user preferences: how assign controls
//! are attached, discovery timing, storage location and layout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::inject::AssignMode;
use crate::sync::RetryPolicy;

/// Main configuration struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assign_mode: AssignMode,

    /// Container discovery retry schedule
    #[serde(default)]
    pub discovery: RetryPolicy,

    /// Wait after a menu trigger click before looking for the open menu
    #[serde(default = "default_menu_check_delay_ms")]
    pub menu_check_delay_ms: u64,

    /// How long the host takes to render its context menu
    #[serde(default = "default_host_menu_delay_ms")]
    pub host_menu_delay_ms: u64,

    /// Storage file override; defaults to the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,

    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_menu_check_delay_ms() -> u64 {
    50
}

fn default_host_menu_delay_ms() -> u64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assign_mode: AssignMode::default(),
            discovery: RetryPolicy::default(),
            menu_check_delay_ms: default_menu_check_delay_ms(),
            host_menu_delay_ms: default_host_menu_delay_ms(),
            storage_path: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.layout.validate();

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("chatfolders").join("config.json"))
    }

    pub fn menu_check_delay(&self) -> Duration {
        Duration::from_millis(self.menu_check_delay_ms)
    }

    pub fn host_menu_delay(&self) -> Duration {
        Duration::from_millis(self.host_menu_delay_ms)
    }
}

/// Layout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Folder panel width as percentage (20-60%)
    #[serde(default = "default_panel_width")]
    pub panel_width_pct: u8,

    /// Whether the folder panel starts open
    #[serde(default = "default_panel_open")]
    pub panel_open: bool,
}

fn default_panel_width() -> u8 {
    30
}

fn default_panel_open() -> bool {
    true
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            panel_width_pct: default_panel_width(),
            panel_open: default_panel_open(),
        }
    }
}

impl LayoutConfig {
    /// Validate and clamp panel width to valid range (20-60%)
    pub fn validate(&mut self) {
        self.panel_width_pct = self.panel_width_pct.clamp(20, 60);
    }
}
