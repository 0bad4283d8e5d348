//! Redis connection profiles

use clap::Args;
use serde::{Deserialize, Serialize};

use rdv_core::format::redact;
use rdv_core::{EnvMap, Paths, Result};

use crate::kind::{apply, probe_tcp, require, Field, ProfileKind, ProfilePlugin, Prompt};
use crate::plugin::{Group, Provider};
use crate::store::DocumentStore;

use super::DB;

const DEFAULT_DB: &str = "0";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisProfile {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub tls: bool,
}

impl RedisProfile {
    /// `redis[s]://[:password@]host:port/db`
    pub fn url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        if self.password.is_empty() {
            format!("{}://{}:{}/{}", scheme, self.host, self.port, self.db)
        } else {
            format!(
                "{}://:{}@{}:{}/{}",
                scheme, self.password, self.host, self.port, self.db
            )
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct RedisFields {
    /// Server host
    #[arg(long)]
    pub host: Option<String>,
    /// Server port
    #[arg(long)]
    pub port: Option<String>,
    /// Database number (default 0)
    #[arg(long)]
    pub db: Option<String>,
    /// Password
    #[arg(long)]
    pub password: Option<String>,
    /// Use TLS (`--tls` or `--tls=false`)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub tls: Option<bool>,
}

pub struct Redis {
    store: DocumentStore<RedisProfile>,
}

impl Redis {
    pub fn new(paths: &Paths) -> Self {
        Self {
            store: DocumentStore::new(paths.db.join("redis.yaml")),
        }
    }
}

impl ProfileKind for Redis {
    type Profile = RedisProfile;
    type Store = DocumentStore<RedisProfile>;
    type Fields = RedisFields;

    const NAME: &'static str = "redis";
    const ABOUT: &'static str = "Manage Redis connection profiles";
    const GROUP: Option<Group> = Some(DB);
    const PROBE: bool = true;

    fn store(&self) -> &Self::Store {
        &self.store
    }

    fn overlay(&self, profile: &mut RedisProfile, fields: &RedisFields) {
        apply(&mut profile.host, &fields.host);
        apply(&mut profile.port, &fields.port);
        apply(&mut profile.db, &fields.db);
        apply(&mut profile.password, &fields.password);
        if let Some(tls) = fields.tls {
            profile.tls = tls;
        }
    }

    fn complete(&self, profile: &mut RedisProfile, prompt: &mut dyn Prompt) -> Result<()> {
        let plain = |flag, label| Field {
            flag,
            label,
            secret: false,
        };
        require(&mut profile.host, plain("host", "Host"), prompt)?;
        require(&mut profile.port, plain("port", "Port"), prompt)?;

        // Password is optional and the database number has a default
        if profile.db.trim().is_empty() {
            profile.db = DEFAULT_DB.to_string();
        }
        Ok(())
    }

    fn export(&self, _name: &str, p: &RedisProfile) -> Result<EnvMap> {
        let mut vars = EnvMap::from([
            ("REDIS_URL".to_string(), p.url()),
            ("REDIS_HOST".to_string(), p.host.clone()),
            ("REDIS_PORT".to_string(), p.port.clone()),
            ("REDIS_DB".to_string(), p.db.clone()),
            ("REDIS_TLS".to_string(), p.tls.to_string()),
        ]);
        if !p.password.is_empty() {
            vars.insert("REDIS_PASSWORD".into(), p.password.clone());
        }
        Ok(vars)
    }

    fn describe(&self, p: &RedisProfile) -> Vec<(&'static str, String)> {
        vec![
            ("host", p.host.clone()),
            ("port", p.port.clone()),
            ("db", p.db.clone()),
            ("password", redact(&p.password)),
            ("tls", p.tls.to_string()),
        ]
    }

    fn probe(&self, p: &RedisProfile) -> Result<()> {
        probe_tcp(&p.host, &p.port)
    }
}

pub fn provider(paths: &Paths) -> Box<dyn Provider> {
    Box::new(ProfilePlugin::new(Redis::new(paths)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::NoPrompt;
    use crate::plugin::Context;
    use crate::store::ProfileStore;
    use tempfile::TempDir;

    fn sample() -> RedisProfile {
        RedisProfile {
            host: "cache".into(),
            port: "6379".into(),
            password: String::new(),
            db: "2".into(),
            tls: false,
        }
    }

    #[test]
    fn test_url_forms() {
        assert_eq!(sample().url(), "redis://cache:6379/2");

        let secured = RedisProfile {
            password: "pw".into(),
            tls: true,
            ..sample()
        };
        assert_eq!(secured.url(), "rediss://:pw@cache:6379/2");
    }

    #[test]
    fn test_password_only_when_set() {
        let temp = TempDir::new().unwrap();
        let redis = Redis::new(&Paths::under(temp.path()));

        let vars = redis.export("dev", &sample()).unwrap();
        assert!(!vars.contains_key("REDIS_PASSWORD"));
        assert_eq!(vars["REDIS_TLS"], "false");

        let vars = redis
            .export(
                "dev",
                &RedisProfile {
                    password: "pw".into(),
                    ..sample()
                },
            )
            .unwrap();
        assert_eq!(vars["REDIS_PASSWORD"], "pw");
    }

    #[test]
    fn test_db_defaults_to_zero() {
        let temp = TempDir::new().unwrap();
        let redis = Redis::new(&Paths::under(temp.path()));
        let mut profile = RedisProfile {
            db: String::new(),
            ..sample()
        };

        redis.complete(&mut profile, &mut NoPrompt).unwrap();
        assert_eq!(profile.db, "0");
    }

    #[test]
    fn test_tls_flag_forms() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::under(temp.path());
        let plugin = provider(&paths);
        let run = |args: &[&str]| {
            let matches = plugin
                .command()
                .try_get_matches_from(std::iter::once("redis").chain(args.iter().copied()))
                .unwrap();
            plugin.run(&Context::default(), &matches)
        };

        run(&["set", "--no-prompt", "--host", "h", "--port", "1", "--tls"]).unwrap();
        assert!(Redis::new(&paths).store().load("default").unwrap().tls);

        run(&["modify", "--no-prompt", "--port", "2"]).unwrap();
        assert!(Redis::new(&paths).store().load("default").unwrap().tls);

        run(&["modify", "--no-prompt", "--tls=false"]).unwrap();
        let stored = Redis::new(&paths).store().load("default").unwrap();
        assert!(!stored.tls);
        assert_eq!(stored.port, "2");
        assert_eq!(stored.db, "0");
    }
}
