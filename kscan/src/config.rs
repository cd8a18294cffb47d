use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::walk::TaskFormat;

/// Configuration loaded from ~/.config/kscan/config.toml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Where procfs is mounted.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
        }
    }
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub format: TaskFormat,
    /// Print the last good credentials/exe of an earlier task when a field
    /// cannot be read, instead of leaving it empty.
    #[serde(default)]
    pub reuse_stale_values: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    #[serde(default)]
    pub reuse_stale_values: bool,
}

impl Config {
    /// Load config from the default path, or return defaults if not found.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config from {}", path.display()))
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("kscan")
        .join("config.toml")
}
