//! Configuration Module - User preferences from ~/.rom-filter/config.toml
//!
//! Supports:
//! - Default catalog, category and ROM directory paths
//! - A default filter selection
//! - Copy behavior (verification, error policy)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{Facet, FilterSelection};
use crate::export::CopyOptions;

/// ROM Filter Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Default input and output locations
    pub paths: PathsConfig,
    /// Default filter selection
    pub filter: FilterConfig,
    /// Copy settings
    pub copy: CopyConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Default paths, each overridable on the command line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Full driver information XML (`mame -listxml`)
    pub xml: Option<PathBuf>,
    /// Category file (catver.ini)
    pub catver: Option<PathBuf>,
    /// Directory holding the full ROM set
    pub roms_source: Option<PathBuf>,
    /// Where filtered ROMs are copied
    pub roms_dest: Option<PathBuf>,
}

/// Default filter selection; empty lists include everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub exclude_clones: bool,
    pub max_buttons: Option<u32>,
    pub control_type: Vec<String>,
    pub buttons: Vec<String>,
    pub ways: Vec<String>,
    pub players: Vec<String>,
    pub status: Vec<String>,
    pub emulation: Vec<String>,
    pub savestate: Vec<String>,
    pub category: Vec<String>,
}

impl FilterConfig {
    /// Configured include list for a facet
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::ControlType => &self.control_type,
            Facet::Buttons => &self.buttons,
            Facet::Ways => &self.ways,
            Facet::Players => &self.players,
            Facet::Status => &self.status,
            Facet::Emulation => &self.emulation,
            Facet::Savestate => &self.savestate,
            Facet::Category => &self.category,
        }
    }

    pub fn to_selection(&self) -> FilterSelection {
        let mut selection = FilterSelection {
            exclude_clones: self.exclude_clones,
            max_buttons: self.max_buttons,
            ..Default::default()
        };
        for facet in Facet::ALL {
            selection.set_included(facet, self.values(facet).iter().cloned());
        }
        selection
    }
}

/// Copy settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Verify blake3 hashes after copy
    pub verify_hash: bool,
    /// Continue copying on individual file errors
    pub continue_on_error: bool,
}

impl CopyConfig {
    pub fn to_options(&self, source: PathBuf, dest: PathBuf) -> CopyOptions {
        CopyOptions {
            source,
            dest,
            dry_run: false,
            verify_hash: self.verify_hash,
            continue_on_error: self.continue_on_error,
        }
    }
}

impl Config {
    /// Load config from the default path, writing the sample config there on
    /// first run
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        match Self::ensure_exists(&path) {
            Ok(_) => Self::load_from(&path),
            Err(e) => {
                tracing::debug!("Using default config: {:#}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "rom-filter")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".rom-filter")
                    .join("config.toml")
            })
    }

    /// Write a commented sample config if none exists yet
    pub fn ensure_exists(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, generate_sample_config())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        tracing::info!("Created default config at {}", path.display());
        Ok(true)
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# ROM Filter Configuration
# Location: ~/.config/rom-filter/config.toml (or %APPDATA%\tunclon\rom-filter\config\config.toml on Windows)

[general]
# Log level: trace, debug, info, warn, error
log_level = "info"

[paths]
# Full driver information, as written by `mame -listxml`
# xml = "/home/user/mame/mame0261.xml"

# Optional category file
# catver = "/home/user/mame/catver.ini"

# Directory holding <machine>.zip archives
# roms_source = "/home/user/mame/roms"

# Where filtered archives are copied
# roms_dest = "/home/user/cabinet/roms"

[filter]
# Drop clones of other machines
exclude_clones = false

# Keep only machines with at most this many buttons
# max_buttons = 4

# Include lists per facet (empty = everything)
control_type = []
buttons = []
ways = []
players = []
status = []
emulation = []
savestate = []
category = []

[copy]
# Verify blake3 hashes after copy
verify_hash = false

# Continue copying on individual file errors
continue_on_error = false
"#
    .to_string()
}
