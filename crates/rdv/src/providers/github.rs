//! GitHub tokens

use clap::Args;
use serde::{Deserialize, Serialize};

use rdv_core::format::redact;
use rdv_core::{EnvMap, Paths, Result};

use crate::kind::{apply, require, Field, ProfileKind, ProfilePlugin, Prompt};
use crate::plugin::Provider;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubProfile {
    #[serde(default)]
    pub token: String,
    /// API base for GitHub Enterprise
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_base: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GithubFields {
    /// Personal access token
    #[arg(long)]
    pub token: Option<String>,
    /// API base URL (e.g. https://github.example.com/api/v3/)
    #[arg(long = "api-base")]
    pub api_base: Option<String>,
    /// Login the token belongs to
    #[arg(long)]
    pub user: Option<String>,
}

pub struct Github {
    store: DocumentStore<GithubProfile>,
}

impl Github {
    pub fn new(paths: &Paths) -> Self {
        Self {
            store: DocumentStore::new(&paths.github),
        }
    }
}

impl ProfileKind for Github {
    type Profile = GithubProfile;
    type Store = DocumentStore<GithubProfile>;
    type Fields = GithubFields;

    const NAME: &'static str = "github";
    const ABOUT: &'static str = "Manage GitHub tokens";
    const ALIASES: &'static [&'static str] = &["gh"];

    fn store(&self) -> &Self::Store {
        &self.store
    }

    fn overlay(&self, profile: &mut GithubProfile, fields: &GithubFields) {
        apply(&mut profile.token, &fields.token);
        apply(&mut profile.api_base, &fields.api_base);
        apply(&mut profile.user, &fields.user);
    }

    fn complete(&self, profile: &mut GithubProfile, prompt: &mut dyn Prompt) -> Result<()> {
        require(
            &mut profile.token,
            Field {
                flag: "token",
                label: "GitHub Token",
                secret: true,
            },
            prompt,
        )
    }

    fn export(&self, _name: &str, p: &GithubProfile) -> Result<EnvMap> {
        let mut vars = EnvMap::from([("GITHUB_TOKEN".to_string(), p.token.clone())]);
        if !p.api_base.is_empty() {
            vars.insert("GITHUB_API_BASE".into(), p.api_base.clone());
        }
        if !p.user.is_empty() {
            vars.insert("GITHUB_USER".into(), p.user.clone());
        }
        Ok(vars)
    }

    fn describe(&self, p: &GithubProfile) -> Vec<(&'static str, String)> {
        vec![
            ("token", redact(&p.token)),
            ("api_base", p.api_base.clone()),
            ("user", p.user.clone()),
        ]
    }
}

pub fn provider(paths: &Paths) -> Box<dyn Provider> {
    Box::new(ProfilePlugin::new(Github::new(paths)))
}
