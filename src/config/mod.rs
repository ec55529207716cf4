//! User preferences persisted next to the ledger store.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Daily limit used when the store has never recorded one.
pub const DEFAULT_LIMIT: f64 = 2000.0;

/// What to do when a persisted value cannot be decoded at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Refuse to open the ledger.
    #[default]
    Strict,
    /// Log a warning and use the key's default.
    Fallback,
}

/// What to do when the cached total disagrees with the recorded entries at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriftPolicy {
    /// Recompute the total from the entries and persist it.
    #[default]
    Repair,
    /// Keep the cached total as loaded.
    Trust,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_limit_value")]
    pub default_limit: f64,
    #[serde(default)]
    pub decode_policy: DecodePolicy,
    #[serde(default)]
    pub drift_policy: DriftPolicy,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_true")]
    pub ui_color_enabled: bool,
    #[serde(default = "Config::default_true")]
    pub confirm_destructive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit_value(),
            decode_policy: DecodePolicy::default(),
            drift_policy: DriftPolicy::default(),
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: true,
            confirm_destructive: true,
        }
    }
}

impl Config {
    pub fn default_limit_value() -> f64 {
        DEFAULT_LIMIT
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    fn default_true() -> bool {
        true
    }
}

/// Loads and saves [`Config`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: &Path) -> Result<Self> {
        let config_dir = base.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;
        Ok(Self::new(config_dir.join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the saved configuration, or the defaults when nothing was saved yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            LedgerError::Config(format!("{}: {}", self.path.display(), err))
        })
    }

    /// Like [`load`](Self::load), but writes the defaults out on first use so there is a
    /// file to edit.
    pub fn load_or_init(&self) -> Result<Config> {
        if self.path.exists() {
            return self.load();
        }
        let config = Config::default();
        self.save(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
