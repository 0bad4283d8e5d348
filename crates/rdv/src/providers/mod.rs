//! Built-in providers
//!
//! Each provider is a [`ProfileKind`](crate::kind::ProfileKind) over one
//! store adapter. New providers are added to [`BUILTIN`].

pub mod aws;
pub mod gcp;
pub mod github;
pub mod mysql;
pub mod postgres;
pub mod redis;

use rdv_core::Paths;

use crate::plugin::{Constructor, Group, Registry, RegistryError};

/// `rdv db ...`
pub const DB: Group = Group {
    name: "db",
    about: "Manage database connection settings",
};

/// Constructors for every provider shipped with rdv
pub const BUILTIN: &[Constructor] = &[
    aws::provider,
    postgres::provider,
    mysql::provider,
    redis::provider,
    github::provider,
    gcp::provider,
];

/// Registry with all built-in providers
pub fn registry(paths: &Paths) -> Result<Registry, RegistryError> {
    Registry::from_constructors(paths, BUILTIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_registry() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&Paths::under(temp.path())).unwrap();

        assert_eq!(
            registry.names(),
            vec!["aws", "gcp", "github", "mysql", "postgres", "redis"]
        );
        for (target, name) in [
            ("aws", "aws"),
            ("db.postgres", "postgres"),
            ("pg", "postgres"),
            ("mysql", "mysql"),
            ("db.redis", "redis"),
            ("gh", "github"),
            ("gcloud", "gcp"),
        ] {
            assert_eq!(registry.resolve(target).map(|p| p.name()), Some(name));
        }
    }

    #[test]
    fn test_builtin_twice_is_duplicate() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::under(temp.path());
        let mut registry = registry(&paths).unwrap();

        let err = registry.register(aws::provider(&paths)).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("aws".into()));
    }
}
