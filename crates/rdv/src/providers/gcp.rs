//! Google Cloud profiles, one document per profile
//!
//! A service-account key can be copied next to the profile document
//! (`<name>.json`) so the profile keeps working if the original moves.

use chrono::{DateTime, Utc};
use clap::{Arg, ArgAction, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rdv_core::format::redact;
use rdv_core::{EnvMap, Paths, RdvError, Result};

use crate::kind::{apply, require, Field, ProfileKind, ProfilePlugin, Prompt};
use crate::plugin::Provider;
use crate::store::{remove_if_exists, write_private, ProfileFileStore, ProfileStore};

const KEY_EXTENSION: &str = "json";

/// How tools authenticate against Google Cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GcpAuth {
    /// Service account JSON key file
    ServiceAccountJson,
    /// gcloud application default credentials
    GcloudAdc,
}

impl GcpAuth {
    fn as_str(self) -> &'static str {
        match self {
            Self::ServiceAccountJson => "service-account-json",
            Self::GcloudAdc => "gcloud-adc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpProfile {
    #[serde(default)]
    pub auth: Option<GcpAuth>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub copied_key_file: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GcpProfile {
    /// Key file handed to client libraries, preferring the copy
    pub fn credentials_file(&self) -> Option<&str> {
        [&self.copied_key_file, &self.key_file]
            .into_iter()
            .find(|p| !p.is_empty())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct GcpFields {
    /// Authentication method
    #[arg(long, value_enum)]
    pub auth: Option<GcpAuth>,
    /// Project ID
    #[arg(long = "project-id")]
    pub project_id: Option<String>,
    /// Region (e.g. us-central1)
    #[arg(long)]
    pub region: Option<String>,
    /// Zone (e.g. us-central1-a)
    #[arg(long)]
    pub zone: Option<String>,
    /// Service account JSON key file
    #[arg(long = "key-file")]
    pub key_file: Option<String>,
    /// Copy the key file into the rdv config directory
    #[arg(long = "copy-key")]
    pub copy_key: bool,
}

pub struct Gcp {
    store: ProfileFileStore<GcpProfile>,
}

impl Gcp {
    pub fn new(paths: &Paths) -> Self {
        Self {
            store: ProfileFileStore::new(&paths.gcp),
        }
    }

    /// Where `--copy-key` puts the key for `name`
    pub fn copied_key_path(&self, name: &str) -> PathBuf {
        self.store.sibling(name, KEY_EXTENSION)
    }
}

/// Expand `~` and make `path` absolute
fn normalize_path(path: &str) -> Result<String> {
    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|e| RdvError::read(Path::new("."), e))?
            .join(expanded)
    };
    Ok(absolute.display().to_string())
}

impl ProfileKind for Gcp {
    type Profile = GcpProfile;
    type Store = ProfileFileStore<GcpProfile>;
    type Fields = GcpFields;

    const NAME: &'static str = "gcp";
    const ABOUT: &'static str = "Manage Google Cloud profiles";
    const ALIASES: &'static [&'static str] = &["gcloud"];

    fn store(&self) -> &Self::Store {
        &self.store
    }

    fn overlay(&self, profile: &mut GcpProfile, fields: &GcpFields) {
        if let Some(auth) = fields.auth {
            profile.auth = Some(auth);
        }
        apply(&mut profile.project_id, &fields.project_id);
        apply(&mut profile.region, &fields.region);
        apply(&mut profile.zone, &fields.zone);
        apply(&mut profile.key_file, &fields.key_file);
    }

    fn complete(&self, profile: &mut GcpProfile, prompt: &mut dyn Prompt) -> Result<()> {
        if profile.auth.is_none() {
            let answer = prompt.ask(&Field {
                flag: "auth",
                label: "Authentication (service-account-json or gcloud-adc)",
                secret: false,
            })?;
            let auth = GcpAuth::from_str(answer.trim(), true).map_err(|_| {
                RdvError::usage("auth must be 'service-account-json' or 'gcloud-adc'")
            })?;
            profile.auth = Some(auth);
        }

        require(
            &mut profile.project_id,
            Field {
                flag: "project-id",
                label: "Project ID",
                secret: false,
            },
            prompt,
        )?;

        if profile.auth == Some(GcpAuth::ServiceAccountJson) && profile.copied_key_file.is_empty() {
            require(
                &mut profile.key_file,
                Field {
                    flag: "key-file",
                    label: "Service account key file",
                    secret: false,
                },
                prompt,
            )?;
        }
        Ok(())
    }

    fn prepare(&self, name: &str, profile: &mut GcpProfile, fields: &GcpFields) -> Result<()> {
        if !profile.key_file.is_empty() {
            profile.key_file = normalize_path(&profile.key_file)?;
        }

        if fields.copy_key {
            if profile.key_file.is_empty() {
                return Err(RdvError::usage("--copy-key needs --key-file"));
            }
            let source = Path::new(&profile.key_file);
            let key = std::fs::read(source).map_err(|e| RdvError::read(source, e))?;
            let target = self.copied_key_path(name);
            write_private(&target, &key)?;
            tracing::debug!(profile = name, target = %target.display(), "copied key file");
            profile.copied_key_file = target.display().to_string();
        }

        profile.updated_at = Some(Utc::now());
        Ok(())
    }

    fn export(&self, name: &str, p: &GcpProfile) -> Result<EnvMap> {
        let Some(auth) = p.auth else {
            return Err(RdvError::not_found(name, &self.store.location(name)));
        };

        let mut vars = EnvMap::from([
            ("CLOUDSDK_CORE_PROJECT".to_string(), p.project_id.clone()),
            ("GOOGLE_CLOUD_PROJECT".to_string(), p.project_id.clone()),
        ]);
        if !p.region.is_empty() {
            vars.insert("GOOGLE_CLOUD_REGION".into(), p.region.clone());
        }
        if !p.zone.is_empty() {
            vars.insert("GOOGLE_CLOUD_ZONE".into(), p.zone.clone());
        }
        if auth == GcpAuth::ServiceAccountJson {
            if let Some(key) = p.credentials_file() {
                vars.insert("GOOGLE_APPLICATION_CREDENTIALS".into(), key.to_string());
            }
        }
        Ok(vars)
    }

    fn describe(&self, p: &GcpProfile) -> Vec<(&'static str, String)> {
        vec![
            ("auth", p.auth.map(GcpAuth::as_str).unwrap_or_default().to_string()),
            ("project_id", p.project_id.clone()),
            ("region", p.region.clone()),
            ("zone", p.zone.clone()),
            ("key_file", redact(&p.key_file)),
            ("copied_key_file", redact(&p.copied_key_file)),
            (
                "updated_at",
                p.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
        ]
    }

    fn delete_args(&self) -> Vec<Arg> {
        vec![Arg::new("purge_key")
            .long("purge-key")
            .action(ArgAction::SetTrue)
            .help("Also delete the copied key file")]
    }

    fn on_delete(&self, name: &str, matches: &ArgMatches) -> Result<()> {
        if !matches.get_flag("purge_key") {
            return Ok(());
        }

        let copied = match self.store.load(name) {
            Ok(profile) if !profile.copied_key_file.is_empty() => PathBuf::from(profile.copied_key_file),
            Ok(_) => return Ok(()),
            Err(RdvError::ProfileNotFound { .. }) => self.copied_key_path(name),
            Err(e) => return Err(e),
        };
        if remove_if_exists(&copied)? {
            tracing::info!(profile = name, path = %copied.display(), "purged copied key");
        }
        Ok(())
    }
}

pub fn provider(paths: &Paths) -> Box<dyn Provider> {
    Box::new(ProfilePlugin::new(Gcp::new(paths)))
}
