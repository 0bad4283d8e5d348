//! rdv core - Shared functionality for the rdv credential manager
//!
//! Profiles for cloud, database and source-hosting providers are stored
//! locally and composed into process environments. This crate holds the
//! pieces that do not depend on any particular provider.

pub mod config;
pub mod dotenv;
pub mod error;
pub mod format;
pub mod paths;
pub mod process;

use std::collections::BTreeMap;

pub use config::Settings;
pub use error::{exit, RdvError, Result};
pub use paths::Paths;
pub use process::ChildOutcome;

/// Environment variable name to value. Ordered so every rendering is stable.
pub type EnvMap = BTreeMap<String, String>;
