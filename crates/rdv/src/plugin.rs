//! Provider plugins and the registry that dispatches to them
//!
//! A provider contributes a command subtree and an export function. The
//! registry owns every provider, mounts their commands on the root command
//! and routes parsed matches back to the provider that declared them. The
//! command surface never names a concrete provider type.

use clap::{ArgMatches, Command};
use std::collections::BTreeMap;
use thiserror::Error;

use rdv_core::{EnvMap, Result};

/// Settings every provider command sees
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// Emit JSON instead of human-readable output
    pub json: bool,
}

/// A parent command shared by several providers (`rdv db <provider>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub name: &'static str,
    pub about: &'static str,
}

/// Uniform capability surface of one provider
pub trait Provider {
    /// Unique registry key and command name
    fn name(&self) -> &'static str;

    /// Parent command, if the provider is not mounted at the root
    fn group(&self) -> Option<Group> {
        None
    }

    /// Extra names accepted by `env export` / `exec` selectors
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// The provider's command subtree
    fn command(&self) -> Command;

    /// Mount [`Provider::command`] on `root`, creating the group if needed
    fn register(&self, root: Command) -> Command {
        let command = self.command();
        let Some(group) = self.group() else {
            return root.subcommand(command);
        };

        let root = if root.find_subcommand(group.name).is_some() {
            root
        } else {
            root.subcommand(
                Command::new(group.name)
                    .about(group.about)
                    .subcommand_required(true)
                    .arg_required_else_help(true),
            )
        };
        root.mut_subcommand(group.name, |g| g.subcommand(command))
    }

    /// Run the subcommand matched under this provider's command
    fn run(&self, ctx: &Context, matches: &ArgMatches) -> Result<()>;

    /// Export variables for one stored profile
    fn export_vars(&self, profile: &str) -> Result<EnvMap>;

    /// Whether a selector target names this provider
    fn answers_to(&self, target: &str) -> bool {
        self.qualified_name() == target || self.name() == target || self.aliases().contains(&target)
    }

    /// `group.name`, or just the name at the root
    fn qualified_name(&self) -> String {
        match self.group() {
            Some(group) => format!("{}.{}", group.name, self.name()),
            None => self.name().to_string(),
        }
    }
}

/// Registry construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("provider {0:?} is already registered")]
    Duplicate(String),
}

/// Builds one provider from the resolved paths
pub type Constructor = fn(&rdv_core::Paths) -> Box<dyn Provider>;

/// Catalog of providers keyed by name
///
/// Built once at startup and only read afterwards. Mutation needs
/// `&mut Registry`, so concurrent registration is serialised by the
/// borrow checker rather than a lock.
#[derive(Default)]
pub struct Registry {
    providers: BTreeMap<&'static str, Box<dyn Provider>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.names())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of constructors
    pub fn from_constructors(
        paths: &rdv_core::Paths,
        constructors: &[Constructor],
    ) -> std::result::Result<Self, RegistryError> {
        let mut registry = Self::new();
        for construct in constructors {
            registry.register(construct(paths))?;
        }
        Ok(registry)
    }

    /// Add a provider. Its name and aliases must not collide with any
    /// already registered provider.
    pub fn register(&mut self, provider: Box<dyn Provider>) -> std::result::Result<(), RegistryError> {
        let name = provider.name();
        if self.providers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let qualified = provider.qualified_name();
        let claimed = std::iter::once(name)
            .chain(std::iter::once(qualified.as_str()))
            .chain(provider.aliases().iter().copied());
        for target in claimed {
            if self.resolve(target).is_some() {
                return Err(RegistryError::Duplicate(target.to_string()));
            }
        }

        tracing::trace!(provider = name, "registered provider");
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    /// Provider names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Find the provider a selector target refers to
    pub fn resolve(&self, target: &str) -> Option<&dyn Provider> {
        self.providers
            .values()
            .find(|p| p.answers_to(target))
            .map(|p| p.as_ref())
    }

    /// Accepted targets, for error messages
    pub fn targets(&self) -> String {
        self.providers
            .values()
            .map(|p| p.qualified_name())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Mount every provider's commands on `root`
    pub fn load_all(&self, root: Command) -> Command {
        self.providers.values().fold(root, |root, p| p.register(root))
    }

    /// Route matches to the provider that owns the matched subcommand.
    ///
    /// Returns `None` when the subcommand belongs to no provider.
    pub fn dispatch(&self, ctx: &Context, matches: &ArgMatches) -> Option<Result<()>> {
        let (name, sub) = matches.subcommand()?;

        if let Some(provider) = self.get(name).filter(|p| p.group().is_none()) {
            return Some(provider.run(ctx, sub));
        }

        let (member, member_matches) = sub.subcommand()?;
        let provider = self
            .get(member)
            .filter(|p| p.group().map(|g| g.name) == Some(name))?;
        Some(provider.run(ctx, member_matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdv_core::RdvError;

    struct Fake {
        name: &'static str,
        group: Option<Group>,
        aliases: &'static [&'static str],
    }

    fn fake(name: &'static str) -> Fake {
        Fake {
            name,
            group: None,
            aliases: &[],
        }
    }

    const DB: Group = Group {
        name: "db",
        about: "Databases",
    };

    impl Provider for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn group(&self) -> Option<Group> {
            self.group
        }

        fn aliases(&self) -> &'static [&'static str] {
            self.aliases
        }

        fn command(&self) -> Command {
            Command::new(self.name).subcommand(Command::new("list"))
        }

        fn run(&self, _ctx: &Context, matches: &ArgMatches) -> Result<()> {
            match matches.subcommand_name() {
                Some("list") => Ok(()),
                other => Err(RdvError::usage(format!("{}: unexpected {:?}", self.name, other))),
            }
        }

        fn export_vars(&self, profile: &str) -> Result<EnvMap> {
            Ok(EnvMap::from([(self.name.to_uppercase(), profile.to_string())]))
        }
    }

    #[test]
    fn test_duplicate_name_is_an_error() {
        let mut registry = Registry::new();
        registry.register(Box::new(fake("aws"))).unwrap();

        let err = registry.register(Box::new(fake("aws"))).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("aws".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_collision_is_an_error() {
        let mut registry = Registry::new();
        let mut gh = fake("github");
        gh.aliases = &["gh"];
        registry.register(Box::new(gh)).unwrap();

        let mut other = fake("gitlab");
        other.aliases = &["gh"];
        assert_eq!(
            registry.register(Box::new(other)).unwrap_err(),
            RegistryError::Duplicate("gh".into())
        );
    }

    #[test]
    fn test_registries_are_isolated() {
        let mut a = Registry::new();
        a.register(Box::new(fake("aws"))).unwrap();
        let b = Registry::new();

        assert!(a.get("aws").is_some());
        assert!(b.get("aws").is_none());
    }

    #[test]
    fn test_resolve_by_qualified_name_and_alias() {
        let mut registry = Registry::new();
        let mut pg = fake("postgres");
        pg.group = Some(DB);
        pg.aliases = &["pg"];
        registry.register(Box::new(pg)).unwrap();

        for target in ["db.postgres", "postgres", "pg"] {
            assert_eq!(registry.resolve(target).map(|p| p.name()), Some("postgres"));
        }
        assert!(registry.resolve("mysql").is_none());
        assert_eq!(registry.targets(), "db.postgres");
    }

    #[test]
    fn test_load_all_and_dispatch() {
        let mut registry = Registry::new();
        registry.register(Box::new(fake("aws"))).unwrap();
        let mut pg = fake("postgres");
        pg.group = Some(DB);
        registry.register(Box::new(pg)).unwrap();
        let mut redis = fake("redis");
        redis.group = Some(DB);
        registry.register(Box::new(redis)).unwrap();

        let root = registry.load_all(Command::new("rdv").subcommand(Command::new("exec")));
        let db = root.find_subcommand("db").unwrap();
        assert!(db.find_subcommand("postgres").is_some());
        assert!(db.find_subcommand("redis").is_some());

        let ctx = Context::default();
        let matches = root
            .clone()
            .try_get_matches_from(["rdv", "db", "redis", "list"])
            .unwrap();
        registry.dispatch(&ctx, &matches).unwrap().unwrap();

        let matches = root
            .clone()
            .try_get_matches_from(["rdv", "aws", "list"])
            .unwrap();
        registry.dispatch(&ctx, &matches).unwrap().unwrap();

        let matches = root.try_get_matches_from(["rdv", "exec"]).unwrap();
        assert!(registry.dispatch(&ctx, &matches).is_none());
    }
}
