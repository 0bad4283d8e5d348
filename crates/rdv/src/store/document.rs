//! One YAML document per provider
//!
//! ```yaml
//! profiles:
//!   default:
//!     host: localhost
//!     port: "5432"
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rdv_core::{RdvError, Result};

use super::{read_optional, validate_name, write_private, ProfileStore};

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "P: Serialize + DeserializeOwned")]
struct Document<P> {
    #[serde(default)]
    profiles: BTreeMap<String, P>,
}

impl<P> Default for Document<P> {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }
}

/// Profiles of one provider in a single `profiles:` document
#[derive(Debug, Clone)]
pub struct DocumentStore<P> {
    path: PathBuf,
    _profile: PhantomData<fn() -> P>,
}

impl<P> DocumentStore<P>
where
    P: Serialize + DeserializeOwned + Clone,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _profile: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Document<P>> {
        match read_optional(&self.path)? {
            Some(content) if !content.trim().is_empty() => {
                serde_yaml::from_str(&content).map_err(|e| RdvError::read(&self.path, e))
            }
            _ => Ok(Document::default()),
        }
    }

    fn write(&self, doc: &Document<P>) -> Result<()> {
        let content = serde_yaml::to_string(doc).map_err(|e| RdvError::write(&self.path, e))?;
        write_private(&self.path, content.as_bytes())
    }
}

impl<P> ProfileStore for DocumentStore<P>
where
    P: Serialize + DeserializeOwned + Clone,
{
    type Profile = P;

    fn load(&self, name: &str) -> Result<P> {
        self.read()?
            .profiles
            .remove(name)
            .ok_or_else(|| RdvError::not_found(name, &self.path))
    }

    fn save(&self, name: &str, profile: &P) -> Result<()> {
        validate_name(name)?;
        let mut doc = self.read()?;
        doc.profiles.insert(name.to_string(), profile.clone());
        self.write(&doc)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut doc = self.read()?;
        if doc.profiles.remove(name).is_some() {
            self.write(&doc)?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.read()?.profiles.into_keys().collect())
    }

    fn location(&self, _name: &str) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        host: String,
        #[serde(default)]
        tls: bool,
    }

    fn record(host: &str) -> Record {
        Record {
            host: host.to_string(),
            tls: true,
        }
    }

    fn store(temp: &TempDir) -> DocumentStore<Record> {
        DocumentStore::new(temp.path().join("db/records.yaml"))
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.save("dev", &record("localhost")).unwrap();
        assert_eq!(store.load("dev").unwrap(), record("localhost"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.list().unwrap().is_empty());
        let err = store.load("default").unwrap_err();
        assert!(matches!(err, RdvError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_save_keeps_other_profiles() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.save("y", &record("y-host")).unwrap();
        store.save("x", &record("x-host")).unwrap();

        assert_eq!(store.load("y").unwrap(), record("y-host"));
        assert_eq!(store.list().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_save_replaces() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.save("dev", &record("old")).unwrap();
        store.save("dev", &record("new")).unwrap();
        assert_eq!(store.load("dev").unwrap().host, "new");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.delete("ghost").unwrap();
        store.delete("ghost").unwrap();

        store.save("dev", &record("h")).unwrap();
        store.delete("dev").unwrap();
        store.delete("dev").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.save("Dev", &record("upper")).unwrap();
        store.save("dev", &record("lower")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["Dev", "dev"]);
        assert_eq!(store.load("Dev").unwrap().host, "upper");
    }

    #[test]
    fn test_external_edit_is_observed() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.save("dev", &record("h")).unwrap();

        std::fs::write(store.path(), "profiles:\n  ci:\n    host: edited\n").unwrap();

        assert_eq!(store.list().unwrap(), vec!["ci"]);
        assert!(!store.load("ci").unwrap().tls);
    }

    #[test]
    fn test_corrupt_document_is_read_error() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        std::fs::create_dir_all(temp.path().join("db")).unwrap();
        std::fs::write(store.path(), "profiles: [oops").unwrap();

        let err = store.save("dev", &record("h")).unwrap_err();
        assert_eq!(err.exit_code(), rdv_core::exit::CONFIG_READ_WRITE);
    }
}
