//! Node configuration
//!
//! A node is described by a small TOML document:
//!
//! ```toml
//! name = "csharp"
//! address = "kernel://local/csharp"
//! log_profile = "production"   # optional, defaults to "development"
//! ```

use crate::address::NodeAddress;
use relay_errors::{RelayError, Result};
use relay_logging::Profile;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Human-readable node name, used in the terminal stage's diagnostic name
    pub name: String,
    pub address: NodeAddress,
    #[serde(default)]
    pub log_profile: Profile,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>, address: NodeAddress) -> Self {
        Self {
            name: name.into(),
            address,
            log_profile: Profile::default(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| RelayError::ConfigParse {
            reason: e.to_string(),
        })?;
        if config.name.trim().is_empty() {
            return Err(RelayError::ConfigParse {
                reason: "node name must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| RelayError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }
}
