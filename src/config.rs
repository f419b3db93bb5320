// Configuration management for symfeat

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::windows::WindowConfig;

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Features to output, by name. Empty means every registered feature.
    /// Dependencies are computed either way.
    #[serde(default)]
    pub features: Vec<String>,

    /// Overall-only or overall plus sequential windows
    #[serde(default)]
    pub windows: WindowConfig,

    /// Worker threads for per-window evaluation (1 runs inline)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            windows: WindowConfig::default(),
            workers: default_workers(),
        }
    }
}

impl Config {
    /// Load config from disk or return default
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        Self::default()
    }

    /// Load config from disk, failing on read or parse errors
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("symfeat")
            .join("config.toml")
    }

    /// Checks that can run before any piece is loaded
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.windows.sequential {
            self.windows.spec.validate()?;
        }
        Ok(())
    }

    /// Requested feature names, `None` when every feature is wanted
    pub fn requested_features(&self) -> Option<&[String]> {
        (!self.features.is_empty()).then_some(self.features.as_slice())
    }
}

/// Default worker count (for serde): one per available core
fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
