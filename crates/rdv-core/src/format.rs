//! Output formatting utilities

use serde::Serialize;

use crate::error::Result;
use crate::EnvMap;

/// Mask a secret for display.
///
/// Reveals the first and last two characters; four characters or fewer
/// become a fixed mask. Empty stays empty.
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => String::new(),
        1..=4 => "****".to_string(),
        n => {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[n - 2..].iter().collect();
            format!("{}****{}", head, tail)
        }
    }
}

/// Pretty JSON for stdout
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

/// `export KEY=VALUE` lines in key order
pub fn export_lines(vars: &EnvMap) -> String {
    vars.iter()
        .map(|(k, v)| format!("export {}={}\n", k, v))
        .collect()
}

/// Aligned `  key: value` lines under a `profile:` header
pub fn profile_block(profile: &str, fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = format!("profile: {}\n", profile);
    for (key, value) in fields {
        out.push_str(&format!("  {:<width$}: {}\n", key, value, width = width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(redact(""), "");
        assert_eq!(redact("ab"), "****");
        assert_eq!(redact("abcd"), "****");
        assert_eq!(redact("abcde"), "ab****de");
        assert_eq!(redact("abcdef"), "ab****ef");
    }

    #[test]
    fn test_redact_multibyte() {
        assert_eq!(redact("åßçdéf"), "åß****éf");
    }

    #[test]
    fn test_export_lines_sorted() {
        let mut vars = EnvMap::new();
        vars.insert("B".into(), "2".into());
        vars.insert("A".into(), "1".into());
        assert_eq!(export_lines(&vars), "export A=1\nexport B=2\n");
    }

    #[test]
    fn test_profile_block() {
        let block = profile_block(
            "dev",
            &[("host", "localhost".into()), ("password", "****".into())],
        );
        assert_eq!(
            block,
            "profile: dev\n  host    : localhost\n  password: ****\n"
        );
    }
}
