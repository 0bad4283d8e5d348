//! MySQL connection profiles

use clap::Args;
use serde::{Deserialize, Serialize};

use rdv_core::format::redact;
use rdv_core::{EnvMap, Paths, Result};

use crate::kind::{apply, probe_tcp, require, Field, ProfileKind, ProfilePlugin, Prompt};
use crate::plugin::{Group, Provider};
use crate::store::DocumentStore;

use super::DB;

const DEFAULT_PARAMS: &str = "parseTime=true";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlProfile {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub dbname: String,
    /// Extra DSN query parameters
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub params: String,
}

impl MysqlProfile {
    fn params(&self) -> &str {
        if self.params.is_empty() {
            DEFAULT_PARAMS
        } else {
            &self.params
        }
    }

    /// Driver DSN: `user:pass@tcp(host:port)/db?params`
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?{}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.dbname,
            self.params()
        )
    }

    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}?{}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.dbname,
            self.params()
        )
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct MysqlFields {
    /// Server host
    #[arg(long)]
    pub host: Option<String>,
    /// Server port
    #[arg(long)]
    pub port: Option<String>,
    /// Database name
    #[arg(long)]
    pub dbname: Option<String>,
    /// User name
    #[arg(long)]
    pub user: Option<String>,
    /// Password
    #[arg(long)]
    pub password: Option<String>,
    /// Extra DSN params (default parseTime=true)
    #[arg(long)]
    pub params: Option<String>,
}

pub struct Mysql {
    store: DocumentStore<MysqlProfile>,
}

impl Mysql {
    pub fn new(paths: &Paths) -> Self {
        Self {
            store: DocumentStore::new(paths.db.join("mysql.yaml")),
        }
    }
}

impl ProfileKind for Mysql {
    type Profile = MysqlProfile;
    type Store = DocumentStore<MysqlProfile>;
    type Fields = MysqlFields;

    const NAME: &'static str = "mysql";
    const ABOUT: &'static str = "Manage MySQL connection profiles";
    const GROUP: Option<Group> = Some(DB);
    const PROBE: bool = true;

    fn store(&self) -> &Self::Store {
        &self.store
    }

    fn overlay(&self, profile: &mut MysqlProfile, fields: &MysqlFields) {
        apply(&mut profile.host, &fields.host);
        apply(&mut profile.port, &fields.port);
        apply(&mut profile.dbname, &fields.dbname);
        apply(&mut profile.user, &fields.user);
        apply(&mut profile.password, &fields.password);
        apply(&mut profile.params, &fields.params);
    }

    fn complete(&self, profile: &mut MysqlProfile, prompt: &mut dyn Prompt) -> Result<()> {
        let plain = |flag, label| Field {
            flag,
            label,
            secret: false,
        };
        require(&mut profile.host, plain("host", "Host"), prompt)?;
        require(&mut profile.port, plain("port", "Port"), prompt)?;
        require(&mut profile.dbname, plain("dbname", "Database"), prompt)?;
        require(&mut profile.user, plain("user", "User"), prompt)?;
        require(
            &mut profile.password,
            Field {
                flag: "password",
                label: "Password",
                secret: true,
            },
            prompt,
        )
    }

    fn export(&self, _name: &str, p: &MysqlProfile) -> Result<EnvMap> {
        Ok(EnvMap::from([
            ("MYSQL_DATABASE_URL".to_string(), p.url()),
            ("MYSQL_DSN".to_string(), p.dsn()),
            ("MYSQL_HOST".to_string(), p.host.clone()),
            ("MYSQL_PORT".to_string(), p.port.clone()),
            ("MYSQL_USER".to_string(), p.user.clone()),
            ("MYSQL_PASSWORD".to_string(), p.password.clone()),
            ("MYSQL_DATABASE".to_string(), p.dbname.clone()),
        ]))
    }

    fn describe(&self, p: &MysqlProfile) -> Vec<(&'static str, String)> {
        vec![
            ("host", p.host.clone()),
            ("port", p.port.clone()),
            ("dbname", p.dbname.clone()),
            ("user", p.user.clone()),
            ("password", redact(&p.password)),
            ("params", p.params().to_string()),
        ]
    }

    fn probe(&self, p: &MysqlProfile) -> Result<()> {
        probe_tcp(&p.host, &p.port)
    }
}

pub fn provider(paths: &Paths) -> Box<dyn Provider> {
    Box::new(ProfilePlugin::new(Mysql::new(paths)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProfileStore;
    use tempfile::TempDir;

    fn sample() -> MysqlProfile {
        MysqlProfile {
            host: "127.0.0.1".into(),
            port: "3306".into(),
            user: "root".into(),
            password: "pw".into(),
            dbname: "shop".into(),
            params: String::new(),
        }
    }

    #[test]
    fn test_default_params() {
        let p = sample();
        assert_eq!(p.dsn(), "root:pw@tcp(127.0.0.1:3306)/shop?parseTime=true");
        assert_eq!(p.url(), "mysql://root:pw@127.0.0.1:3306/shop?parseTime=true");
    }

    #[test]
    fn test_custom_params() {
        let p = MysqlProfile {
            params: "tls=skip-verify".into(),
            ..sample()
        };
        assert!(p.dsn().ends_with("/shop?tls=skip-verify"));
    }

    #[test]
    fn test_export_vars() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::under(temp.path());
        Mysql::new(&paths).store().save("dev", &sample()).unwrap();

        let vars = provider(&paths).export_vars("dev").unwrap();
        let keys: Vec<&str> = vars.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "MYSQL_DATABASE",
                "MYSQL_DATABASE_URL",
                "MYSQL_DSN",
                "MYSQL_HOST",
                "MYSQL_PASSWORD",
                "MYSQL_PORT",
                "MYSQL_USER",
            ]
        );
        assert_eq!(vars["MYSQL_DATABASE"], "shop");
    }

    #[test]
    fn test_params_not_persisted_when_empty() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::under(temp.path());
        Mysql::new(&paths).store().save("dev", &sample()).unwrap();

        let content = std::fs::read_to_string(paths.db.join("mysql.yaml")).unwrap();
        assert!(!content.contains("params"));
    }
}
