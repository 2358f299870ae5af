//! Global daybook configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{DaybookError, DaybookResult};

/// Configuration at `~/.config/daybook/config.toml`.
///
/// `user_id` is the stable identifier handed out by the auth collaborator;
/// its presence is what makes a session "signed in". Sync additionally
/// needs a `provider` name to resolve the remote binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub provider: Option<String>,
}

impl GlobalConfig {
    pub fn config_path() -> DaybookResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DaybookError::Config("Could not determine config directory".into()))?
            .join("daybook");
        Ok(config_dir.join("config.toml"))
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load() -> DaybookResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw)
            .map_err(|e| DaybookError::Config(format!("{}: {e}", path.display())))
    }

    /// Where the durable collections live.
    pub fn data_dir(&self) -> DaybookResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|d| d.join("daybook"))
            .ok_or_else(|| DaybookError::Config("Could not determine data directory".into()))
    }
}
