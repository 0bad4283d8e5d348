//! rdv - Local developer-environment credential manager
//!
//! Commands:
//! - aws | db postgres | db mysql | db redis | github | gcp:
//!   set, modify, delete, list, show, export
//! - env export --set target:profile...: merged variables of several profiles
//! - exec [selectors] -- <command>: run a command with profiles injected
//!
//! Exit codes are stable (see `rdv_core::exit`); `exec` exits with the
//! child's own code.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use rdv::cli;
use rdv::providers;
use rdv_core::{exit, Paths, RdvError, Settings};

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            err.downcast_ref::<RdvError>()
                .map_or(exit::UNKNOWN, RdvError::exit_code)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let paths = Paths::new();
    let registry = providers::registry(&paths)?;

    let matches = match cli::root(&registry).try_get_matches() {
        Ok(matches) => matches,
        Err(e) => e.exit(),
    };
    let global = cli::global_args(&matches)?;

    let settings_file = global.config.clone().unwrap_or_else(|| paths.settings_file());
    let settings = Settings::load(&settings_file)?.with_env(|key| std::env::var(key).ok());

    init_logging(global.debug, settings.log_level.as_deref());
    tracing::debug!(settings = %settings_file.display(), "starting");

    let outcome = cli::run(&registry, &settings, &matches)?;
    Ok(outcome.exit_code())
}

/// Log to stderr: --debug, else RUST_LOG, else the settings level, else warn
fn init_logging(debug: bool, level: Option<&str>) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("warn")))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
