//! Command surface
//!
//! The root command is derived here; provider commands are mounted on it by
//! the [`Registry`] at startup. Parsed matches go to the registry first and
//! fall back to the core commands below.

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

use rdv_core::{process, ChildOutcome, RdvError, Result, Settings};

use crate::compose::{emit, Composer, Selector};
use crate::plugin::{Context, Registry};

#[derive(Parser, Debug)]
#[command(name = "rdv")]
#[command(about = "Local developer-environment credential manager")]
#[command(version)]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[command(after_help = r#"SELECTORS:
    target:profile, applied in order (later selections win):
    - aws:dev
    - db:postgres:dev     (same as db.postgres:dev or pg:dev)
    - github:default

EXAMPLES:
    rdv aws set -p dev --access-key AKIA... --secret-key ...
    rdv env export --set aws:dev --set db:postgres:dev -o .env
    rdv exec --aws dev --pg dev -- ./migrate.sh"#)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<CoreCommand>,
}

/// Flags accepted anywhere on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Settings file (default: <config dir>/rdv/rdv.yaml)
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CoreCommand {
    /// Compose profiles into environment variables
    #[command(subcommand)]
    Env(EnvCommand),

    /// Run a command with profiles injected into its environment
    Exec(ExecArgs),
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Print or write the merged variables of several profiles
    Export {
        /// Profile to include, as target:profile (repeatable, later wins)
        #[arg(long = "set", value_name = "TARGET:PROFILE", required = true)]
        set: Vec<Selector>,

        /// Merge into this dotenv file instead of printing
        #[arg(short = 'o', long = "env-file", value_name = "PATH")]
        env_file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Profile to include, as target:profile (repeatable)
    #[arg(long = "set", value_name = "TARGET:PROFILE")]
    pub set: Vec<Selector>,

    /// AWS profile
    #[arg(long, value_name = "PROFILE")]
    pub aws: Option<String>,

    /// PostgreSQL profile
    #[arg(long, value_name = "PROFILE")]
    pub pg: Option<String>,

    /// MySQL profile
    #[arg(long, value_name = "PROFILE")]
    pub mysql: Option<String>,

    /// Redis profile
    #[arg(long, value_name = "PROFILE")]
    pub redis: Option<String>,

    /// GitHub profile
    #[arg(long, value_name = "PROFILE")]
    pub github: Option<String>,

    /// GCP profile
    #[arg(long, value_name = "PROFILE")]
    pub gcp: Option<String>,

    /// Start from an empty environment instead of the current one
    #[arg(long = "no-inherit", conflicts_with = "inherit")]
    pub no_inherit: bool,

    /// Start from the current environment even when settings say otherwise
    #[arg(long)]
    pub inherit: bool,

    /// Command to run and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Exec shortcut flag to the target it selects
const SHORTCUTS: &[(&str, &str)] = &[
    ("aws", "aws"),
    ("pg", "db.postgres"),
    ("mysql", "db.mysql"),
    ("redis", "db.redis"),
    ("github", "github"),
    ("gcp", "gcp"),
];

/// What a successful invocation produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// `exec` ran a child; its code becomes ours
    Child(ChildOutcome),
}

impl ExecArgs {
    /// Whether the child starts from our environment; flags beat settings
    pub fn inherits(&self, settings: &Settings) -> bool {
        if self.inherit {
            true
        } else if self.no_inherit {
            false
        } else {
            settings.inherit_env
        }
    }
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Done => rdv_core::exit::OK,
            Self::Child(child) => child.exit_code(),
        }
    }
}

/// Root command with every provider mounted
pub fn root(registry: &Registry) -> clap::Command {
    registry.load_all(Cli::command())
}

/// Global flags from root matches
pub fn global_args(matches: &ArgMatches) -> Result<GlobalArgs> {
    GlobalArgs::from_arg_matches(matches).map_err(|e| RdvError::usage(e.to_string()))
}

/// Selectors of an `exec` invocation in command-line order, whichever
/// flag spelled them
pub fn ordered_selectors(matches: &ArgMatches) -> Vec<Selector> {
    let mut found: Vec<(usize, Selector)> = vec![];

    if let (Some(indices), Some(values)) = (
        matches.indices_of("set"),
        matches.get_many::<Selector>("set"),
    ) {
        found.extend(indices.zip(values.cloned()));
    }

    for (id, target) in SHORTCUTS {
        if let (Some(index), Some(profile)) =
            (matches.index_of(id), matches.get_one::<String>(id))
        {
            found.push((index, Selector::new(target, profile)));
        }
    }

    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, selector)| selector).collect()
}

/// Run whatever `matches` selected
pub fn run(registry: &Registry, settings: &Settings, matches: &ArgMatches) -> Result<Outcome> {
    let global = global_args(matches)?;
    let ctx = Context {
        json: global.json || settings.json,
    };

    if let Some(result) = registry.dispatch(&ctx, matches) {
        return result.map(|_| Outcome::Done);
    }

    let command = CoreCommand::from_arg_matches(matches).map_err(|e| RdvError::usage(e.to_string()))?;
    match command {
        CoreCommand::Env(EnvCommand::Export { set, env_file }) => {
            cmd_env_export(registry, &ctx, &set, env_file.as_deref())?;
            Ok(Outcome::Done)
        }
        CoreCommand::Exec(args) => {
            let exec_matches = matches
                .subcommand_matches("exec")
                .ok_or_else(|| RdvError::usage("exec arguments missing"))?;
            let selectors = ordered_selectors(exec_matches);
            cmd_exec(registry, settings, &selectors, &args).map(Outcome::Child)
        }
    }
}

/// Merge selections and present them
fn cmd_env_export(
    registry: &Registry,
    ctx: &Context,
    selectors: &[Selector],
    env_file: Option<&std::path::Path>,
) -> Result<()> {
    if selectors.is_empty() {
        return Err(RdvError::usage("provide at least one --set target:profile"));
    }

    let vars = Composer::new(registry).merge(selectors)?;
    emit(ctx, &vars, env_file)
}

/// Compose an environment and run the child in it
fn cmd_exec(
    registry: &Registry,
    settings: &Settings,
    selectors: &[Selector],
    args: &ExecArgs,
) -> Result<ChildOutcome> {
    if selectors.is_empty() {
        return Err(RdvError::usage(
            "nothing to inject: pass --set target:profile or a provider flag such as --aws",
        ));
    }
    if args.command.is_empty() {
        return Err(RdvError::usage(
            "provide a command to run, e.g. rdv exec --aws dev -- env",
        ));
    }

    let inherit = args.inherits(settings);
    let env = Composer::new(registry).build_env(selectors, inherit)?;
    tracing::debug!(selectors = selectors.len(), inherit, vars = env.len(), "environment composed");

    process::run(&args.command, &env)
}
