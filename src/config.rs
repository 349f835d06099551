// ⚙️ Gallery Configuration
//
// Resolution order: built-in defaults ← TOML file ← POKEDEX_* environment.

use crate::loader::FailurePolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "POKEDEX_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pokedex.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Catalog endpoint; the creature id is appended as the last path segment
    pub api_base_url: String,
    pub first_id: u32,
    pub last_id: u32,
    /// Fetches allowed in flight at once
    pub max_concurrency: usize,
    pub failure_policy: FailurePolicy,
    pub request_timeout_secs: u64,
    /// SQLite snapshot used by `import` / `--offline`
    pub database_path: PathBuf,
    pub server_addr: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://pokeapi.co/api/v2/pokemon".to_string(),
            first_id: 1,
            last_id: 200,
            max_concurrency: 10,
            failure_policy: FailurePolicy::FailFast,
            request_timeout_secs: 30,
            database_path: PathBuf::from("pokedex.db"),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl GalleryConfig {
    /// Defaults, then the config file if one exists, then environment overrides.
    pub fn resolve() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: GalleryConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("POKEDEX_API_URL") {
            self.api_base_url = url;
        }
        if let Some(last) = lookup("POKEDEX_LAST_ID") {
            self.last_id = last
                .parse()
                .with_context(|| format!("POKEDEX_LAST_ID is not a number: {last}"))?;
        }
        if let Some(n) = lookup("POKEDEX_CONCURRENCY") {
            self.max_concurrency = n
                .parse()
                .with_context(|| format!("POKEDEX_CONCURRENCY is not a number: {n}"))?;
        }
        if let Some(db) = lookup("POKEDEX_DB") {
            self.database_path = PathBuf::from(db);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_id == 0 {
            bail!("first_id must be at least 1");
        }
        if self.first_id > self.last_id {
            bail!(
                "invalid id range: first_id {} > last_id {}",
                self.first_id,
                self.last_id
            );
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn id_range(&self) -> RangeInclusive<u32> {
        self.first_id..=self.last_id
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_catalog_range() {
        let config = GalleryConfig::default();
        assert_eq!(config.id_range(), 1..=200);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GalleryConfig::from_toml_str(
            r#"
            last_id = 151
            failure_policy = "partial"
            "#,
        )
        .unwrap();

        assert_eq!(config.id_range(), 1..=151);
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
        assert_eq!(config.max_concurrency, 10);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = GalleryConfig::from_toml_str("first_id = 10\nlast_id = 3").unwrap_err();
        assert!(err.to_string().contains("invalid id range"));
        assert!(GalleryConfig::from_toml_str("first_id = 0").is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = GalleryConfig::from_toml_str("request_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
        assert!(GalleryConfig::from_toml_str("request_timeout_secs = 1").is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("POKEDEX_API_URL", "http://localhost:8080/pokemon"),
            ("POKEDEX_LAST_ID", "3"),
            ("POKEDEX_CONCURRENCY", "2"),
        ]
        .into_iter()
        .collect();

        let mut config = GalleryConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080/pokemon");
        assert_eq!(config.id_range(), 1..=3);
        assert_eq!(config.max_concurrency, 2);

        let mut bad = GalleryConfig::default();
        assert!(bad
            .apply_env_overrides(|k| (k == "POKEDEX_LAST_ID").then(|| "many".to_string()))
            .is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokedex.toml");
        fs::write(&path, "database_path = \"snap.db\"\nrequest_timeout_secs = 5\n").unwrap();

        let config = GalleryConfig::load(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("snap.db"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
