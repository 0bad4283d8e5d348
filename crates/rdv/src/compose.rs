//! Environment composition
//!
//! Turns `target:profile` selectors into one variable mapping. Selections
//! are applied in the order given and later ones overwrite earlier ones on
//! key collisions; there is no other tie-break.

use std::path::Path;
use std::str::FromStr;

use rdv_core::format::{export_lines, print_json};
use rdv_core::{dotenv, EnvMap, RdvError, Result};

use crate::plugin::{Context, Registry};

/// One `target:profile` selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Provider target, `:` normalised to `.` (`db:postgres` is `db.postgres`)
    pub target: String,
    pub profile: String,
}

impl Selector {
    pub fn new(target: &str, profile: &str) -> Self {
        Self {
            target: target.replace(':', "."),
            profile: profile.to_string(),
        }
    }
}

impl FromStr for Selector {
    type Err = RdvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.rsplit_once(':') {
            Some((target, profile)) if !target.is_empty() && !profile.is_empty() => {
                Ok(Self::new(target, profile))
            }
            _ => Err(RdvError::usage(format!(
                "invalid selector {:?} (expected target:profile, e.g. aws:dev or db:postgres:dev)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.target, self.profile)
    }
}

/// Resolves selections against a registry
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    registry: &'a Registry,
}

impl<'a> Composer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Export variables for one profile of the provider `target` names.
    ///
    /// An unknown target fails before any provider is consulted.
    pub fn export_for(&self, target: &str, profile: &str) -> Result<EnvMap> {
        let target = target.replace(':', ".");
        let provider = self
            .registry
            .resolve(&target)
            .ok_or_else(|| RdvError::UnknownTarget {
                target: target.clone(),
                expected: self.registry.targets(),
            })?;
        provider.export_vars(profile)
    }

    /// Apply `selections` in order on top of `base`
    pub fn build_env_from(&self, mut base: EnvMap, selections: &[Selector]) -> Result<EnvMap> {
        for selection in selections {
            let vars = self.export_for(&selection.target, &selection.profile)?;
            tracing::debug!(selector = %selection, vars = vars.len(), "applying selection");
            base.extend(vars);
        }
        Ok(base)
    }

    /// Merge the selections alone
    pub fn merge(&self, selections: &[Selector]) -> Result<EnvMap> {
        self.build_env_from(EnvMap::new(), selections)
    }

    /// Compose a child environment, seeded from ours when `inherit` is set
    pub fn build_env(&self, selections: &[Selector], inherit: bool) -> Result<EnvMap> {
        let base = if inherit { inherited() } else { EnvMap::new() };
        self.build_env_from(base, selections)
    }
}

/// The current process environment. Entries that are not valid UTF-8
/// are dropped.
fn inherited() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Load `path` (missing is empty), let `vars` win, rewrite sorted
pub fn merge_into_dotenv(path: &Path, vars: &EnvMap) -> Result<EnvMap> {
    dotenv::merge_into(path, vars)
}

/// Present exported variables: merged into `env_file` when given,
/// otherwise printed as export lines or JSON.
pub fn emit(ctx: &Context, vars: &EnvMap, env_file: Option<&Path>) -> Result<()> {
    let Some(path) = env_file else {
        if ctx.json {
            return print_json(vars);
        }
        print!("{}", export_lines(vars));
        return Ok(());
    };

    merge_into_dotenv(path, vars)?;
    tracing::info!(path = %path.display(), vars = vars.len(), "dotenv written");

    if ctx.json {
        print_json(&serde_json::json!({
            "written": vars.len(),
            "path": path.display().to_string(),
            "vars": vars,
        }))
    } else {
        println!("wrote {} vars to {}", vars.len(), path.display());
        Ok(())
    }
}
