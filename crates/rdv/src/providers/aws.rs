//! AWS access keys in the shared credentials and config files

use clap::Args;

use rdv_core::format::redact;
use rdv_core::{EnvMap, Paths, RdvError, Result};

use crate::kind::{apply, require, Field, ProfileKind, ProfilePlugin, Prompt};
use crate::plugin::Provider;
use crate::store::sections::Entries;
use crate::store::{SectionRecord, SectionStore};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const REGION: &str = "region";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsProfile {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl SectionRecord for AwsProfile {
    fn secret_entries(&self) -> Entries {
        Entries::from([
            (ACCESS_KEY_ID.to_string(), self.access_key_id.clone()),
            (SECRET_ACCESS_KEY.to_string(), self.secret_access_key.clone()),
        ])
    }

    fn setting_entries(&self) -> Entries {
        Entries::from([(REGION.to_string(), self.region.clone())])
    }

    fn from_entries(secrets: &Entries, settings: &Entries) -> Self {
        let get = |entries: &Entries, key: &str| entries.get(key).cloned().unwrap_or_default();
        Self {
            access_key_id: get(secrets, ACCESS_KEY_ID),
            secret_access_key: get(secrets, SECRET_ACCESS_KEY),
            region: get(settings, REGION),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct AwsFields {
    /// AWS access key id
    #[arg(long = "access-key")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long = "secret-key")]
    pub secret_key: Option<String>,

    /// Default region (e.g. us-east-1)
    #[arg(long)]
    pub region: Option<String>,
}

pub struct Aws {
    store: SectionStore<AwsProfile>,
}

impl Aws {
    pub fn new(paths: &Paths) -> Self {
        Self {
            store: SectionStore::new(&paths.aws_credentials, &paths.aws_config),
        }
    }
}

impl ProfileKind for Aws {
    type Profile = AwsProfile;
    type Store = SectionStore<AwsProfile>;
    type Fields = AwsFields;

    const NAME: &'static str = "aws";
    const ABOUT: &'static str = "Manage AWS credentials";

    fn store(&self) -> &Self::Store {
        &self.store
    }

    fn overlay(&self, profile: &mut AwsProfile, fields: &AwsFields) {
        apply(&mut profile.access_key_id, &fields.access_key);
        apply(&mut profile.secret_access_key, &fields.secret_key);
        apply(&mut profile.region, &fields.region);
    }

    fn complete(&self, profile: &mut AwsProfile, prompt: &mut dyn Prompt) -> Result<()> {
        require(
            &mut profile.access_key_id,
            Field {
                flag: "access-key",
                label: "AWS Access Key ID",
                secret: false,
            },
            prompt,
        )?;
        require(
            &mut profile.secret_access_key,
            Field {
                flag: "secret-key",
                label: "AWS Secret Access Key",
                secret: true,
            },
            prompt,
        )
    }

    fn export(&self, name: &str, profile: &AwsProfile) -> Result<EnvMap> {
        // A settings-only profile has nothing to export
        if profile.access_key_id.is_empty() || profile.secret_access_key.is_empty() {
            return Err(RdvError::not_found(name, self.store.secrets_path()));
        }

        let mut vars = EnvMap::from([
            ("AWS_ACCESS_KEY_ID".to_string(), profile.access_key_id.clone()),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                profile.secret_access_key.clone(),
            ),
        ]);
        if !profile.region.is_empty() {
            vars.insert("AWS_DEFAULT_REGION".into(), profile.region.clone());
        }
        Ok(vars)
    }

    fn describe(&self, profile: &AwsProfile) -> Vec<(&'static str, String)> {
        vec![
            ("aws_access_key_id", redact(&profile.access_key_id)),
            ("aws_secret_access_key", redact(&profile.secret_access_key)),
            ("region", profile.region.clone()),
        ]
    }
}

pub fn provider(paths: &Paths) -> Box<dyn Provider> {
    Box::new(ProfilePlugin::new(Aws::new(paths)))
}
