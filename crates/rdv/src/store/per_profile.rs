//! One YAML document per profile: `<dir>/<name>.yaml`

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rdv_core::{RdvError, Result};

use super::{read_optional, remove_if_exists, validate_name, write_private, ProfileStore};

const EXTENSION: &str = "yaml";

/// Profiles stored as individual files in one directory
#[derive(Debug, Clone)]
pub struct ProfileFileStore<P> {
    dir: PathBuf,
    _profile: PhantomData<fn() -> P>,
}

impl<P> ProfileFileStore<P>
where
    P: Serialize + DeserializeOwned,
{
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _profile: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a file belonging to `name` with the given extension
    pub fn sibling(&self, name: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, extension))
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.sibling(name, EXTENSION)
    }
}

/// Names become file names, so path syntax is rejected
fn validate_file_name(name: &str) -> Result<()> {
    validate_name(name)?;
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(RdvError::usage(format!(
            "invalid profile name {:?}: must not contain path separators or start with '.'",
            name
        )));
    }
    Ok(())
}

impl<P> ProfileStore for ProfileFileStore<P>
where
    P: Serialize + DeserializeOwned,
{
    type Profile = P;

    fn load(&self, name: &str) -> Result<P> {
        validate_file_name(name)?;
        let path = self.profile_path(name);

        let content = read_optional(&path)?.ok_or_else(|| RdvError::not_found(name, &path))?;
        serde_yaml::from_str(&content).map_err(|e| RdvError::read(&path, e))
    }

    fn save(&self, name: &str, profile: &P) -> Result<()> {
        validate_file_name(name)?;
        let path = self.profile_path(name);

        let content = serde_yaml::to_string(profile).map_err(|e| RdvError::write(&path, e))?;
        write_private(&path, content.as_bytes())
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_file_name(name)?;
        remove_if_exists(&self.profile_path(name))?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| RdvError::read(&self.dir, e))?;

        let mut names = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| RdvError::read(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_file_name(stem).is_ok() => names.push(stem.to_string()),
                _ => continue,
            }
        }

        names.sort();
        Ok(names)
    }

    fn location(&self, name: &str) -> PathBuf {
        self.profile_path(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        project: String,
    }

    fn record(project: &str) -> Record {
        Record {
            project: project.to_string(),
        }
    }

    #[test]
    fn test_round_trip_and_list() {
        let temp = TempDir::new().unwrap();
        let store = ProfileFileStore::<Record>::new(temp.path().join("gcp"));

        store.save("prod", &record("p")).unwrap();
        store.save("dev", &record("d")).unwrap();
        fs::write(temp.path().join("gcp/notes.txt"), "ignored").unwrap();

        assert_eq!(store.load("dev").unwrap(), record("d"));
        assert_eq!(store.list().unwrap(), vec!["dev", "prod"]);
    }

    #[test]
    fn test_missing_dir() {
        let temp = TempDir::new().unwrap();
        let store = ProfileFileStore::<Record>::new(temp.path().join("nope"));

        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.load("default").unwrap_err(),
            RdvError::ProfileNotFound { .. }
        ));
        store.delete("default").unwrap();
    }

    #[test]
    fn test_delete_leaves_siblings() {
        let temp = TempDir::new().unwrap();
        let store = ProfileFileStore::<Record>::new(temp.path());

        store.save("dev", &record("d")).unwrap();
        fs::write(store.sibling("dev", "json"), "{}").unwrap();

        store.delete("dev").unwrap();
        store.delete("dev").unwrap();

        assert!(!store.sibling("dev", "yaml").exists());
        assert!(store.sibling("dev", "json").exists());
    }

    #[test]
    fn test_rejects_path_names() {
        let temp = TempDir::new().unwrap();
        let store = ProfileFileStore::<Record>::new(temp.path());

        assert!(store.save("../escape", &record("x")).is_err());
        assert!(store.save(".hidden", &record("x")).is_err());
    }

    #[test]
    fn test_list_skips_unloadable_files() {
        let temp = TempDir::new().unwrap();
        let store = ProfileFileStore::<Record>::new(temp.path());

        store.save("dev", &record("d")).unwrap();
        fs::write(temp.path().join(".x.yaml"), "project: hidden\n").unwrap();
        fs::write(temp.path().join(" .yaml"), "project: blank\n").unwrap();

        let names = store.list().unwrap();
        assert_eq!(names, vec!["dev"]);
        for name in names {
            store.load(&name).unwrap();
        }
    }
}
