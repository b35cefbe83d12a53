//! `config.json` under the tracker home.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use credit_storage_json::write_atomic;

use crate::{Config, ConfigError};

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/config/config.json`. Nothing is created until the first save.
    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; a present one must parse.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|err| ConfigError::Serde(err.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let bytes =
            serde_json::to_vec_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    /// Loads the stored config, changes one setting and writes it back.
    pub fn update(&self, key: &str, value: &str) -> Result<Config, ConfigError> {
        let mut config = self.load()?;
        config.set(key, value)?;
        self.save(&config)?;
        Ok(config)
    }
}
