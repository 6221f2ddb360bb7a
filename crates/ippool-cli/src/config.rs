//! CLI configuration
//!
//! Optional TOML file providing defaults for flags the user leaves out. A missing file
//! means defaults; a file that exists but cannot be read or parsed is an error.

use crate::{CliError, Result};
use ippool_core::IpPoolError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// State file used when `--state-file` is not given
    pub state_file: Option<PathBuf>,
    /// Log filter when `--verbose` is not given
    pub log_level: String,
    pub terraform: TerraformConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Variable name used when `--variable-name` is not given
    pub variable_name: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            log_level: "warn".to_string(),
            terraform: TerraformConfig::default(),
        }
    }
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            variable_name: "ip_plan".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(path).map_err(|e| {
            CliError::FileSystem(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: CliConfig = toml::from_str(&config_str).map_err(|e| {
            CliError::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CliError::Configuration(format!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join("|"),
                self.log_level
            )));
        }
        if self.terraform.variable_name.trim().is_empty() {
            return Err(CliError::Configuration(
                "terraform.variable_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// State file from the flag, else from the configuration
    pub fn resolve_state_file(&self, flag: Option<&Path>) -> ippool_core::Result<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.state_file.clone())
            .ok_or_else(|| IpPoolError::business("state file is required"))
    }
}
