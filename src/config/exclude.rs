// src/config/exclude.rs
//! Domains dropped from web-search enrichment.
//!
//! Both file formats carry the same shape, `domains = [...]` in TOML or
//! `{"domains": [...]}` in JSON. The format is picked by file extension.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const ENV_PATH: &str = "SEARCH_EXCLUDE_PATH";
const DEFAULT_PATHS: [&str; 2] = ["config/search_exclude.toml", "config/search_exclude.json"];

#[derive(Debug, Deserialize)]
struct ExcludeFile {
    #[serde(default)]
    domains: Vec<String>,
}

/// Canonical form of a domain or link for substring matching.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Normalized, non-empty, deduplicated entries.
pub fn normalize_domains<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|d| normalize_domain(d.as_ref()))
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn load_from(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading search exclude list {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let file: ExcludeFile = match ext.as_deref() {
        Some("toml") => toml::from_str(&raw)
            .with_context(|| format!("parsing {} as TOML", path.display()))?,
        Some("json") => serde_json::from_str(&raw)
            .with_context(|| format!("parsing {} as JSON", path.display()))?,
        _ => bail!(
            "{}: search exclude list must be a .toml or .json file",
            path.display()
        ),
    };
    Ok(normalize_domains(file.domains))
}

/// `$SEARCH_EXCLUDE_PATH` if set (it must exist), else the first default path present.
fn resolve_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let p = PathBuf::from(p);
        if !p.is_file() {
            bail!("{ENV_PATH}={} does not exist", p.display());
        }
        return Ok(Some(p));
    }
    Ok(DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.is_file()))
}

/// Exclude list for the running service; no file means nothing is excluded.
pub fn load_default() -> Result<Vec<String>> {
    let Some(path) = resolve_path()? else {
        return Ok(Vec::new());
    };
    let domains = load_from(&path)?;
    tracing::info!(path = %path.display(), domains = domains.len(), "search exclude list loaded");
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn normalization_trims_lowercases_and_dedups() {
        assert_eq!(
            normalize_domains([" Example.com ", "", "spam.io", "SPAM.io", "   "]),
            vec!["example.com".to_string(), "spam.io".to_string()]
        );
    }

    #[test]
    fn format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_p = dir.path().join("x.toml");
        fs::write(&toml_p, r#"domains = ["Pinterest.com"]"#).unwrap();
        assert_eq!(load_from(&toml_p).unwrap(), vec!["pinterest.com".to_string()]);

        let json_p = dir.path().join("x.json");
        fs::write(&json_p, r#"{"domains": ["quora.com", "quora.com"]}"#).unwrap();
        assert_eq!(load_from(&json_p).unwrap(), vec!["quora.com".to_string()]);

        // TOML body behind a .json name is not sniffed.
        let wrong = dir.path().join("y.json");
        fs::write(&wrong, r#"domains = ["a.com"]"#).unwrap();
        assert!(load_from(&wrong).is_err());

        let txt = dir.path().join("z.txt");
        fs::write(&txt, r#"{"domains": []}"#).unwrap();
        assert!(load_from(&txt).is_err());
    }

    #[test]
    fn missing_domains_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("empty.toml");
        fs::write(&p, "# nothing here\n").unwrap();
        assert!(load_from(&p).unwrap().is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn default_prefers_env_path_then_config_dir() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PATH);

        assert!(load_default().unwrap().is_empty());

        let cfg_dir = tmp.path().join("config");
        fs::create_dir_all(&cfg_dir).unwrap();
        fs::write(cfg_dir.join("search_exclude.json"), r#"{"domains": ["b.com"]}"#).unwrap();
        assert_eq!(load_default().unwrap(), vec!["b.com".to_string()]);

        fs::write(cfg_dir.join("search_exclude.toml"), r#"domains = ["a.com"]"#).unwrap();
        assert_eq!(load_default().unwrap(), vec!["a.com".to_string()]);

        let custom = tmp.path().join("custom.json");
        fs::write(&custom, r#"{"domains": ["x.com"]}"#).unwrap();
        env::set_var(ENV_PATH, custom.display().to_string());
        assert_eq!(load_default().unwrap(), vec!["x.com".to_string()]);

        env::set_var(ENV_PATH, tmp.path().join("missing.json").display().to_string());
        assert!(load_default().is_err());

        env::remove_var(ENV_PATH);
        env::set_current_dir(&old).unwrap();
    }
}
