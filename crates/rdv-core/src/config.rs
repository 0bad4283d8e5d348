//! Settings file for rdv
//!
//! `~/.config/rdv/rdv.yaml`, all keys optional:
//!
//! ```yaml
//! json: false         # structured output by default
//! inherit_env: true   # exec starts from the current environment
//! log_level: warn     # tracing filter when RUST_LOG is unset
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RdvError, Result};

/// Global rdv settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Emit JSON instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Whether exec inherits the invoking environment
    #[serde(default = "default_inherit_env")]
    pub inherit_env: bool,

    /// Log filter used when RUST_LOG is not set
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_inherit_env() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            json: false,
            inherit_env: default_inherit_env(),
            log_level: None,
        }
    }
}

impl Settings {
    /// Load settings from file. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| RdvError::read(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| RdvError::read(path, e))
    }

    /// Apply `RDV_JSON` and `RDV_LOG_LEVEL` overrides
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(json) = lookup("RDV_JSON") {
            self.json = matches!(json.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(level) = lookup("RDV_LOG_LEVEL").filter(|l| !l.is_empty()) {
            self.log_level = Some(level);
        }
        self
    }
}
