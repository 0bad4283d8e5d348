//! Dotenv files
//!
//! One `KEY=VALUE` per line, no quoting. Blank lines, `#` comments and
//! anything that is not `KEY=VALUE` are skipped on read. Writes always
//! emit every entry in ascending key order so the files diff cleanly.
//!
//! Writes are not atomic: a crash mid-write can leave a truncated file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{RdvError, Result};
use crate::EnvMap;

/// Parse dotenv content
pub fn parse(content: &str) -> EnvMap {
    let mut vars = EnvMap::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Split at the first '='; keys must be non-empty and unspaced
        if let Some((key, value)) = line.split_once('=') {
            if key.is_empty() || key.chars().any(char::is_whitespace) {
                continue;
            }
            vars.insert(key.to_string(), value.to_string());
        }
    }

    vars
}

/// Render `vars` as sorted `KEY=VALUE` lines
pub fn render(vars: &EnvMap) -> String {
    vars.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect()
}

/// Read a dotenv file. A missing file is an empty mapping.
pub fn read(path: &Path) -> std::io::Result<EnvMap> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(EnvMap::new()),
        Err(e) => Err(e),
    }
}

/// Merge `vars` into the dotenv file at `path`.
///
/// Existing entries survive unless `vars` has the same key. The whole
/// merged set is rewritten. Returns what was written.
pub fn merge_into(path: &Path, vars: &EnvMap) -> Result<EnvMap> {
    let env_write = |source| RdvError::EnvWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut merged = read(path).map_err(env_write)?;
    merged.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));

    fs::write(path, render(&merged)).map_err(env_write)?;

    tracing::debug!(path = %path.display(), written = vars.len(), total = merged.len(), "dotenv merged");
    Ok(merged)
}
