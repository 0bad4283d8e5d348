//! INI sections split across two cooperating files
//!
//! Secret material goes to one file under `[<name>]`; settings go to the
//! other under `[profile <name>]` (`[default]` for the default profile).
//! This is the layout of the AWS shared credentials and config files.

use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rdv_core::{RdvError, Result};

use super::{read_optional, validate_name, write_private, ProfileStore};

/// Flat key/value pairs of one section
pub type Entries = BTreeMap<String, String>;

/// A profile that splits into a secret section and a settings section
pub trait SectionRecord: Sized {
    /// Keys for the secrets file
    fn secret_entries(&self) -> Entries;

    /// Keys for the settings file
    fn setting_entries(&self) -> Entries;

    /// Rebuild from both sections; a missing section is empty
    fn from_entries(secrets: &Entries, settings: &Entries) -> Self;
}

/// Section-per-profile store over a secrets file and a settings file
#[derive(Debug, Clone)]
pub struct SectionStore<P> {
    secrets: PathBuf,
    settings: PathBuf,
    _profile: PhantomData<fn() -> P>,
}

const SETTINGS_PREFIX: &str = "profile ";

fn settings_section(name: &str) -> String {
    if name == "default" {
        name.to_string()
    } else {
        format!("{}{}", SETTINGS_PREFIX, name)
    }
}

/// Section names end up inside `[...]` headers
fn validate_section_name(name: &str) -> Result<()> {
    validate_name(name)?;
    if name.contains(['[', ']', '\n', '\r']) || name.trim() != name {
        return Err(RdvError::usage(format!(
            "invalid profile name {:?}: must not contain brackets, line breaks or surrounding spaces",
            name
        )));
    }
    Ok(())
}

// Values are stored verbatim; the AWS tools read quotes and backslashes literally
fn read_ini(path: &Path) -> Result<Ini> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    match read_optional(path)? {
        Some(content) => Ini::load_from_str_opt(&content, opt).map_err(|e| RdvError::read(path, e)),
        None => Ok(Ini::new()),
    }
}

fn write_ini(path: &Path, ini: &Ini) -> Result<()> {
    let opt = WriteOption {
        escape_policy: EscapePolicy::Nothing,
        ..Default::default()
    };
    let mut buf = Vec::new();
    ini.write_to_opt(&mut buf, opt)
        .map_err(|e| RdvError::write(path, e))?;
    write_private(path, &buf)
}

fn entries(ini: &Ini, section: &str) -> Option<Entries> {
    ini.section(Some(section)).map(|props| {
        props
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    })
}

/// Drop the section and rewrite it with `values`, skipping empty ones
fn replace_section(ini: &mut Ini, section: &str, values: Entries) {
    ini.delete(Some(section));
    for (key, value) in values.into_iter().filter(|(_, v)| !v.is_empty()) {
        ini.set_to(Some(section), key, value);
    }
}

impl<P: SectionRecord> SectionStore<P> {
    pub fn new(secrets: impl Into<PathBuf>, settings: impl Into<PathBuf>) -> Self {
        Self {
            secrets: secrets.into(),
            settings: settings.into(),
            _profile: PhantomData,
        }
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings
    }
}

impl<P: SectionRecord> ProfileStore for SectionStore<P> {
    type Profile = P;

    fn load(&self, name: &str) -> Result<P> {
        validate_section_name(name)?;
        let secrets = entries(&read_ini(&self.secrets)?, name);
        let settings = entries(&read_ini(&self.settings)?, &settings_section(name));

        if secrets.is_none() && settings.is_none() {
            return Err(RdvError::not_found(name, &self.secrets));
        }

        Ok(P::from_entries(
            &secrets.unwrap_or_default(),
            &settings.unwrap_or_default(),
        ))
    }

    fn save(&self, name: &str, profile: &P) -> Result<()> {
        validate_section_name(name)?;

        let mut secrets = read_ini(&self.secrets)?;
        replace_section(&mut secrets, name, profile.secret_entries());
        write_ini(&self.secrets, &secrets)?;

        let mut settings = read_ini(&self.settings)?;
        replace_section(&mut settings, &settings_section(name), profile.setting_entries());
        write_ini(&self.settings, &settings)
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_section_name(name)?;
        for (path, section) in [
            (&self.secrets, name.to_string()),
            (&self.settings, settings_section(name)),
        ] {
            if !path.exists() {
                continue;
            }
            let mut ini = read_ini(path)?;
            if ini.delete(Some(section)).is_some() {
                write_ini(path, &ini)?;
            }
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();

        let secrets = read_ini(&self.secrets)?;
        names.extend(secrets.sections().flatten().map(str::to_string));

        let settings = read_ini(&self.settings)?;
        names.extend(
            settings
                .sections()
                .flatten()
                .map(|s| s.strip_prefix(SETTINGS_PREFIX).unwrap_or(s).to_string()),
        );

        names.retain(|n| !n.is_empty());
        Ok(names.into_iter().collect())
    }

    fn location(&self, _name: &str) -> PathBuf {
        self.secrets.clone()
    }
}
