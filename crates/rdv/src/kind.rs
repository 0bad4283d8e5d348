//! Generic profile commands
//!
//! Most of a provider is the same CRUD surface over its store. A provider
//! describes only what differs (its record, its flags, validation and
//! export) by implementing [`ProfileKind`]; wrapping it in
//! [`ProfilePlugin`] yields a full [`Provider`] with `set`, `modify`,
//! `delete`, `list`, `show` and `export`.

use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches};
use std::io::{BufRead, IsTerminal, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use rdv_core::format::{print_json, profile_block};
use rdv_core::{EnvMap, RdvError, Result};

use crate::compose;
use crate::plugin::{Context, Group, Provider};
use crate::store::ProfileStore;

const DEFAULT_PROFILE: &str = "default";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// One value a provider may need to ask for
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    /// Flag that would have supplied it, without dashes
    pub flag: &'a str,
    pub label: &'a str,
    /// Read without echo
    pub secret: bool,
}

/// Source of values for required fields missing from the flags
pub trait Prompt {
    fn ask(&mut self, field: &Field) -> Result<String>;
}

/// Non-interactive mode: a missing field is a usage error
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, field: &Field) -> Result<String> {
        Err(RdvError::usage(format!("missing required flag: --{}", field.flag)))
    }
}

/// Reads from the terminal, hiding secret input
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&mut self, field: &Field) -> Result<String> {
        let read = if field.secret {
            rpassword::prompt_password(format!("{}: ", field.label))
        } else {
            eprint!("{}: ", field.label);
            std::io::stderr()
                .flush()
                .and_then(|_| {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line).map(|_| line)
                })
        };

        read.map(|v| v.trim().to_string())
            .map_err(|e| RdvError::usage(format!("failed to read {}: {}", field.label, e)))
    }
}

/// Fill `value` from `prompt` when empty; still empty is a usage error
pub fn require(value: &mut String, field: Field, prompt: &mut dyn Prompt) -> Result<()> {
    if value.trim().is_empty() {
        *value = prompt.ask(&field)?;
    }
    if value.trim().is_empty() {
        return Err(RdvError::usage(format!("missing required flag: --{}", field.flag)));
    }
    Ok(())
}

/// Overwrite `target` with a supplied flag value
pub fn apply(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

/// TCP reachability check used by the database providers' `--test-conn`
pub fn probe_tcp(host: &str, port: &str) -> Result<()> {
    let address = format!("{}:{}", host, port);
    let failed = |reason: String| RdvError::Connectivity(format!("{}: {}", address, reason));

    let candidates = address
        .to_socket_addrs()
        .map_err(|e| failed(e.to_string()))?;

    let mut last = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, PROBE_TIMEOUT) {
            Ok(_) => {
                tracing::debug!(%address, "connection test passed");
                return Ok(());
            }
            Err(e) => last = Some(e),
        }
    }

    Err(failed(
        last.map(|e| e.to_string())
            .unwrap_or_else(|| "no addresses resolved".to_string()),
    ))
}

/// What a provider contributes on top of the generic commands
pub trait ProfileKind {
    type Profile: Default;
    type Store: ProfileStore<Profile = Self::Profile>;
    /// Field flags. Every field is optional so `modify` can tell which
    /// flags were supplied.
    type Fields: Args + FromArgMatches;

    const NAME: &'static str;
    const ABOUT: &'static str;
    const GROUP: Option<Group> = None;
    const ALIASES: &'static [&'static str] = &[];
    /// Offer `--test-conn` on set/modify
    const PROBE: bool = false;

    fn store(&self) -> &Self::Store;

    /// Copy supplied flags onto `profile`
    fn overlay(&self, profile: &mut Self::Profile, fields: &Self::Fields);

    /// Ensure required fields are present, asking `prompt` for the rest
    fn complete(&self, profile: &mut Self::Profile, prompt: &mut dyn Prompt) -> Result<()>;

    /// Last step before saving
    fn prepare(&self, _name: &str, _profile: &mut Self::Profile, _fields: &Self::Fields) -> Result<()> {
        Ok(())
    }

    fn export(&self, name: &str, profile: &Self::Profile) -> Result<EnvMap>;

    /// Display fields, secrets already redacted
    fn describe(&self, profile: &Self::Profile) -> Vec<(&'static str, String)>;

    fn probe(&self, _profile: &Self::Profile) -> Result<()> {
        Ok(())
    }

    /// Extra flags for `delete`
    fn delete_args(&self) -> Vec<Arg> {
        vec![]
    }

    /// Runs before the profile is removed
    fn on_delete(&self, _name: &str, _matches: &ArgMatches) -> Result<()> {
        Ok(())
    }
}

/// A [`ProfileKind`] exposed as a [`Provider`]
#[derive(Debug)]
pub struct ProfilePlugin<K> {
    kind: K,
}

fn profile_arg() -> Arg {
    Arg::new("profile")
        .short('p')
        .long("profile")
        .value_name("NAME")
        .default_value(DEFAULT_PROFILE)
        .help("Profile name")
}

fn no_prompt_arg() -> Arg {
    Arg::new("no_prompt")
        .long("no-prompt")
        .action(ArgAction::SetTrue)
        .help("Fail instead of prompting for missing fields")
}

fn test_conn_arg() -> Arg {
    Arg::new("test_conn")
        .long("test-conn")
        .action(ArgAction::SetTrue)
        .help("Check that the server is reachable after saving")
}

fn env_file_arg() -> Arg {
    Arg::new("env_file")
        .short('o')
        .long("env-file")
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf))
        .help("Merge into this dotenv file instead of printing")
}

fn profile_of(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("profile")
        .map(String::as_str)
        .unwrap_or(DEFAULT_PROFILE)
}

impl<K: ProfileKind> ProfilePlugin<K> {
    pub fn new(kind: K) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    fn fields(matches: &ArgMatches) -> Result<K::Fields> {
        K::Fields::from_arg_matches(matches).map_err(|e| RdvError::usage(e.to_string()))
    }

    fn edit_command(name: &'static str, about: &'static str) -> Command {
        let command = Command::new(name)
            .about(about)
            .arg(profile_arg())
            .arg(no_prompt_arg());
        let command = if K::PROBE {
            command.arg(test_conn_arg())
        } else {
            command
        };
        K::Fields::augment_args(command)
    }

    fn cmd_set(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        let fields = Self::fields(matches)?;
        let mut profile = K::Profile::default();
        self.kind.overlay(&mut profile, &fields);
        self.finish_edit(ctx, matches, profile, &fields, "saved")
    }

    fn cmd_modify(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        let fields = Self::fields(matches)?;
        let mut profile = self.kind.store().load(profile_of(matches))?;
        self.kind.overlay(&mut profile, &fields);
        self.finish_edit(ctx, matches, profile, &fields, "modified")
    }

    fn finish_edit(
        &self,
        ctx: &Context,
        matches: &ArgMatches,
        mut profile: K::Profile,
        fields: &K::Fields,
        status: &str,
    ) -> Result<()> {
        let name = profile_of(matches);

        if matches.get_flag("no_prompt") || !std::io::stdin().is_terminal() {
            self.kind.complete(&mut profile, &mut NoPrompt)?;
        } else {
            self.kind.complete(&mut profile, &mut TerminalPrompt)?;
        }
        self.kind.prepare(name, &mut profile, fields)?;

        self.kind.store().save(name, &profile)?;
        tracing::info!(provider = K::NAME, profile = name, "profile {}", status);

        if K::PROBE && matches.get_flag("test_conn") {
            self.kind.probe(&profile)?;
        }

        if ctx.json {
            print_json(&serde_json::json!({
                "provider": K::NAME,
                "profile": name,
                "status": status,
            }))
        } else {
            println!("success: {} profile {:?} {}", K::NAME, name, status);
            Ok(())
        }
    }

    fn cmd_delete(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        let name = profile_of(matches);
        self.kind.on_delete(name, matches)?;
        self.kind.store().delete(name)?;
        tracing::info!(provider = K::NAME, profile = name, "profile deleted");

        if ctx.json {
            print_json(&serde_json::json!({
                "provider": K::NAME,
                "profile": name,
                "status": "deleted",
            }))
        } else {
            println!("success: {} profile {:?} deleted", K::NAME, name);
            Ok(())
        }
    }

    fn cmd_list(&self, ctx: &Context) -> Result<()> {
        let names = self.kind.store().list()?;

        if ctx.json {
            return print_json(&serde_json::json!({ "profiles": names }));
        }
        if names.is_empty() {
            println!("(no profiles)");
        }
        for name in &names {
            println!("{}", name);
        }
        Ok(())
    }

    fn cmd_show(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        let name = profile_of(matches);
        let profile = self.kind.store().load(name)?;
        let fields = self.kind.describe(&profile);

        if ctx.json {
            let mut object = serde_json::Map::new();
            object.insert("profile".into(), name.into());
            for (key, value) in fields {
                object.insert(key.into(), value.into());
            }
            return print_json(&object);
        }

        print!("{}", profile_block(name, &fields));
        Ok(())
    }

    fn cmd_export(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        let vars = self.export_vars(profile_of(matches))?;
        let env_file = matches.get_one::<PathBuf>("env_file");
        compose::emit(ctx, &vars, env_file.map(PathBuf::as_path))
    }
}

impl<K: ProfileKind> Provider for ProfilePlugin<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn group(&self) -> Option<Group> {
        K::GROUP
    }

    fn aliases(&self) -> &'static [&'static str] {
        K::ALIASES
    }

    fn command(&self) -> Command {
        Command::new(K::NAME)
            .about(K::ABOUT)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Self::edit_command("set", "Create or replace a profile")
                    .visible_alias("set-config"),
            )
            .subcommand(Self::edit_command(
                "modify",
                "Change selected fields of an existing profile",
            ))
            .subcommand(
                Command::new("delete")
                    .about("Delete a profile")
                    .arg(profile_arg())
                    .args(self.kind.delete_args()),
            )
            .subcommand(Command::new("list").about("List profile names"))
            .subcommand(
                Command::new("show")
                    .about("Show a profile with secrets redacted")
                    .arg(profile_arg()),
            )
            .subcommand(
                Command::new("export")
                    .about("Print or write the profile's environment variables")
                    .arg(profile_arg())
                    .arg(env_file_arg()),
            )
    }

    fn run(&self, ctx: &Context, matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("set", m)) => self.cmd_set(ctx, m),
            Some(("modify", m)) => self.cmd_modify(ctx, m),
            Some(("delete", m)) => self.cmd_delete(ctx, m),
            Some(("list", _)) => self.cmd_list(ctx),
            Some(("show", m)) => self.cmd_show(ctx, m),
            Some(("export", m)) => self.cmd_export(ctx, m),
            Some((other, _)) => Err(RdvError::usage(format!(
                "unknown {} command {:?}",
                K::NAME,
                other
            ))),
            None => Err(RdvError::usage(format!("{} needs a subcommand", K::NAME))),
        }
    }

    fn export_vars(&self, profile: &str) -> Result<EnvMap> {
        let record = self.kind.store().load(profile)?;
        self.kind.export(profile, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<&'static str>);

    impl Prompt for Scripted {
        fn ask(&mut self, _field: &Field) -> Result<String> {
            Ok(self.0.pop_front().unwrap_or_default().to_string())
        }
    }

    const HOST: Field<'static> = Field {
        flag: "host",
        label: "Host",
        secret: false,
    };

    #[test]
    fn test_require_keeps_supplied_value() {
        let mut value = "db.local".to_string();
        require(&mut value, HOST, &mut NoPrompt).unwrap();
        assert_eq!(value, "db.local");
    }

    #[test]
    fn test_require_without_prompt_names_flag() {
        let mut value = String::new();
        let err = require(&mut value, HOST, &mut NoPrompt).unwrap_err();
        assert_eq!(err.to_string(), "missing required flag: --host");
        assert_eq!(err.exit_code(), rdv_core::exit::INVALID_ARGS);
    }

    #[test]
    fn test_require_asks_prompt() {
        let mut value = String::new();
        let mut prompt = Scripted(VecDeque::from(["db.local"]));
        require(&mut value, HOST, &mut prompt).unwrap();
        assert_eq!(value, "db.local");

        let mut empty = String::new();
        let mut blank = Scripted(VecDeque::from(["  "]));
        assert!(require(&mut empty, HOST, &mut blank).is_err());
    }

    #[test]
    fn test_apply_only_supplied() {
        let mut value = "old".to_string();
        apply(&mut value, &None);
        assert_eq!(value, "old");
        apply(&mut value, &Some("new".into()));
        assert_eq!(value, "new");
    }

    #[test]
    fn test_probe_unreachable_is_connectivity() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        probe_tcp("127.0.0.1", &port).unwrap();
        drop(listener);

        let err = probe_tcp("127.0.0.1", &port).unwrap_err();
        assert_eq!(err.exit_code(), rdv_core::exit::CONNECTION_FAILED);
    }
}
