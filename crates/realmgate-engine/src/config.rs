//! Boundary configuration (realmgate.toml)

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::realm::RealmResolution;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Boundary configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct GateConfig {
    /// Script-facing bindings
    #[serde(default)]
    pub bindings: BindingsConfig,

    /// Function creation defaults
    #[serde(default)]
    pub functions: FunctionsConfig,
}

/// `[bindings]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BindingsConfig {
    /// Realm resolution used by the `nativeFunction` export
    #[serde(default)]
    pub native_function_resolution: RealmResolution,

    /// Make exported entry points read-only and non-configurable
    #[serde(default = "default_true")]
    pub freeze_exports: bool,
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            native_function_resolution: RealmResolution::default(),
            freeze_exports: true,
        }
    }
}

/// `[functions]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FunctionsConfig {
    /// `allow_new` used by `Platform::function` when the caller leaves it unset
    #[serde(default = "default_true")]
    pub default_allow_new: bool,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            default_allow_new: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl GateConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
