//! Standard paths used by rdv
//!
//! Every location can be moved with an environment variable so tests and
//! sandboxes never touch the real home directory.

use std::path::{Path, PathBuf};

/// Standard rdv paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root configuration directory (~/.config/rdv)
    pub config: PathBuf,
    /// AWS shared credentials file (~/.aws/credentials)
    pub aws_credentials: PathBuf,
    /// AWS config file (~/.aws/config)
    pub aws_config: PathBuf,
    /// Database profile documents (~/.config/rdv/db)
    pub db: PathBuf,
    /// GitHub profile document (~/.config/rdv/github.yaml)
    pub github: PathBuf,
    /// One document per GCP profile (~/.config/rdv/gcp)
    pub gcp: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Resolve paths from the process environment
    pub fn new() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve paths using `lookup` for environment overrides.
    ///
    /// Empty values count as unset.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        let config = var("RDV_CONFIG_DIR").unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| home.join(".config"))
                .join("rdv")
        });

        let aws_credentials =
            var("AWS_SHARED_CREDENTIALS_FILE").unwrap_or_else(|| home.join(".aws/credentials"));
        let aws_config = var("AWS_CONFIG_FILE").unwrap_or_else(|| home.join(".aws/config"));

        let db = var("RDV_DB_DIR").unwrap_or_else(|| config.join("db"));
        let github = var("RDV_GH_DIR")
            .unwrap_or_else(|| config.clone())
            .join("github.yaml");
        let gcp = var("RDV_GCP_DIR").unwrap_or_else(|| config.join("gcp"));

        Self {
            config,
            aws_credentials,
            aws_config,
            db,
            github,
            gcp,
        }
    }

    /// All paths rooted under one directory
    pub fn under(root: &Path) -> Self {
        let config = root.join("rdv");
        Self {
            aws_credentials: root.join("aws/credentials"),
            aws_config: root.join("aws/config"),
            db: config.join("db"),
            github: config.join("github.yaml"),
            gcp: config.join("gcp"),
            config,
        }
    }

    /// Default settings file (~/.config/rdv/rdv.yaml)
    pub fn settings_file(&self) -> PathBuf {
        self.config.join("rdv.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides() {
        let paths = Paths::resolve(lookup(&[
            ("AWS_SHARED_CREDENTIALS_FILE", "/tmp/t/creds"),
            ("AWS_CONFIG_FILE", "/tmp/t/config"),
            ("RDV_DB_DIR", "/tmp/t/db"),
            ("RDV_GH_DIR", "/tmp/t/gh"),
            ("RDV_GCP_DIR", "/tmp/t/gcp"),
        ]));

        assert_eq!(paths.aws_credentials, PathBuf::from("/tmp/t/creds"));
        assert_eq!(paths.aws_config, PathBuf::from("/tmp/t/config"));
        assert_eq!(paths.db, PathBuf::from("/tmp/t/db"));
        assert_eq!(paths.github, PathBuf::from("/tmp/t/gh/github.yaml"));
        assert_eq!(paths.gcp, PathBuf::from("/tmp/t/gcp"));
    }

    #[test]
    fn test_config_dir_moves_provider_defaults() {
        let paths = Paths::resolve(lookup(&[("RDV_CONFIG_DIR", "/tmp/rdv")]));
        assert_eq!(paths.db, PathBuf::from("/tmp/rdv/db"));
        assert_eq!(paths.github, PathBuf::from("/tmp/rdv/github.yaml"));
        assert_eq!(paths.settings_file(), PathBuf::from("/tmp/rdv/rdv.yaml"));
    }

    #[test]
    fn test_empty_override_ignored() {
        let paths = Paths::resolve(lookup(&[("RDV_DB_DIR", ""), ("RDV_CONFIG_DIR", "/x")]));
        assert_eq!(paths.db, PathBuf::from("/x/db"));
    }
}
