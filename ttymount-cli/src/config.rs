//! Configuration file support for ttymount.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (TTYMOUNT_*)
//! 3. Local config file (./ttymount.toml)
//! 4. Global config file (~/.config/ttymount/config.toml)

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Local configuration file name.
const LOCAL_CONFIG_FILE: &str = "ttymount.toml";

/// Device discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Device directory inside the sandbox (e.g., "/dev").
    pub dev_dir: Option<PathBuf>,
    /// Host device directory, when mounted somewhere else (e.g., "/host/dev").
    pub host_dev_dir: Option<PathBuf>,
    /// Extra device name patterns (regular expressions).
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

/// Device node provisioning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Create missing device nodes.
    pub enabled: Option<bool>,
    /// Permission bits for created nodes.
    pub mode: Option<u32>,
}

/// Consumer handoff configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Consumer command line (program followed by arguments).
    #[serde(default)]
    pub command: Vec<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scan configuration.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Provision configuration.
    #[serde(default)]
    pub provision: ProvisionConfig,
    /// Handoff configuration.
    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl Config {
    /// Load configuration from all available sources.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        // Load local config (overrides global)
        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ttymount").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one.
    fn merge(&mut self, other: Self) {
        // Scan config
        if other.scan.dev_dir.is_some() {
            self.scan.dev_dir = other.scan.dev_dir;
        }
        if other.scan.host_dev_dir.is_some() {
            self.scan.host_dev_dir = other.scan.host_dev_dir;
        }
        for pattern in other.scan.extra_patterns {
            if !self.scan.extra_patterns.contains(&pattern) {
                self.scan.extra_patterns.push(pattern);
            }
        }

        // Provision config
        if other.provision.enabled.is_some() {
            self.provision.enabled = other.provision.enabled;
        }
        if other.provision.mode.is_some() {
            self.provision.mode = other.provision.mode;
        }

        // Handoff config
        if !other.handoff.command.is_empty() {
            self.handoff.command = other.handoff.command;
        }
    }
}
