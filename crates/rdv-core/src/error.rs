//! Error taxonomy and the exit codes it maps to

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable exit codes for agents and CI.
///
/// 0 is success; everything else is a specific class of failure. A child
/// started by `rdv exec` that exits non-zero passes its own code through.
pub mod exit {
    pub const OK: i32 = 0;
    pub const UNKNOWN: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const PROFILE_NOT_FOUND: i32 = 3;
    pub const CONFIG_READ_WRITE: i32 = 4;
    pub const CONNECTION_FAILED: i32 = 5;
    pub const ENV_WRITE_FAILED: i32 = 6;
    pub const JSON_ERROR: i32 = 7;
    pub const CHILD_SPAWN_FAILED: i32 = 20;
}

pub type Result<T, E = RdvError> = std::result::Result<T, E>;

type Source = Box<dyn std::error::Error + Send + Sync>;

/// rdv errors
#[derive(Error, Debug)]
pub enum RdvError {
    /// Bad or missing arguments, detected before any side effect
    #[error("{0}")]
    Usage(String),

    #[error("profile {profile:?} not found in {}", path.display())]
    ProfileNotFound { profile: String, path: PathBuf },

    #[error("unknown target {target:?} (expected {expected})")]
    UnknownTarget { target: String, expected: String },

    #[error("failed to {action} {}: {source}", path.display())]
    ConfigReadWrite {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("connection test failed: {0}")]
    Connectivity(String),

    #[error("failed to write {}: {source}", path.display())]
    EnvWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON output: {0}")]
    StructuredOutput(#[from] serde_json::Error),

    #[error("failed to start {program:?}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RdvError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn not_found(profile: &str, path: &Path) -> Self {
        Self::ProfileNotFound {
            profile: profile.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn read(path: &Path, source: impl Into<Source>) -> Self {
        Self::ConfigReadWrite {
            action: "read",
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn write(path: &Path, source: impl Into<Source>) -> Self {
        Self::ConfigReadWrite {
            action: "write",
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// Exit code reported to the OS for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::UnknownTarget { .. } => exit::INVALID_ARGS,
            Self::ProfileNotFound { .. } => exit::PROFILE_NOT_FOUND,
            Self::ConfigReadWrite { .. } => exit::CONFIG_READ_WRITE,
            Self::Connectivity(_) => exit::CONNECTION_FAILED,
            Self::EnvWrite { .. } => exit::ENV_WRITE_FAILED,
            Self::StructuredOutput(_) => exit::JSON_ERROR,
            Self::SpawnFailed { .. } => exit::CHILD_SPAWN_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let io = || std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let errors = [
            RdvError::usage("bad"),
            RdvError::not_found("dev", Path::new("/x")),
            RdvError::read(Path::new("/x"), io()),
            RdvError::Connectivity("refused".into()),
            RdvError::EnvWrite {
                path: PathBuf::from("/x"),
                source: io(),
            },
            RdvError::SpawnFailed {
                program: "nope".into(),
                source: io(),
            },
        ];
        let codes: Vec<i32> = errors.iter().map(RdvError::exit_code).collect();
        assert_eq!(codes, vec![2, 3, 4, 5, 6, 20]);
    }

    #[test]
    fn test_unknown_target_is_usage() {
        let err = RdvError::UnknownTarget {
            target: "nope".into(),
            expected: "aws|github".into(),
        };
        assert_eq!(err.exit_code(), exit::INVALID_ARGS);
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn test_not_found_message() {
        let err = RdvError::not_found("dev", Path::new("/cfg/github.yaml"));
        assert_eq!(
            err.to_string(),
            "profile \"dev\" not found in /cfg/github.yaml"
        );
    }
}
