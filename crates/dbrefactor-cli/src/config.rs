use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "http://localhost:7040";
pub const DEFAULT_ROOT_KEY: &str = "SOLUTION";
pub const DEFAULT_PLAN_FILE: &str = "dbrefactor.plan.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Keys accepted by `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "server",
    "format",
    "root_key",
    "use_synonyms",
    "use_views",
    "cqrs",
    "allow_destructive",
    "timeout_secs",
    "plan_file",
    "llm_url",
    "llm_model",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_synonyms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_views: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cqrs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_destructive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
}

impl ProfileConfig {
    /// Sets one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => self.server = Some(value.trim_end_matches('/').to_string()),
            "format" => {
                if !matches!(value, "json" | "yaml" | "table") {
                    anyhow::bail!("Invalid format: {value}. Valid formats: json, yaml, table");
                }
                self.format = Some(value.to_string());
            }
            "root_key" => self.root_key = Some(value.to_string()),
            "use_synonyms" => self.use_synonyms = Some(parse_bool(key, value)?),
            "use_views" => self.use_views = Some(parse_bool(key, value)?),
            "cqrs" => self.cqrs = Some(parse_bool(key, value)?),
            "allow_destructive" => self.allow_destructive = Some(parse_bool(key, value)?),
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("{key} must be a number of seconds"))?;
                if secs == 0 {
                    anyhow::bail!("{key} must be greater than zero");
                }
                self.timeout_secs = Some(secs);
            }
            "plan_file" => self.plan_file = Some(value.to_string()),
            "llm_url" => self.llm_url = Some(value.trim_end_matches('/').to_string()),
            "llm_model" => self.llm_model = Some(value.to_string()),
            other => anyhow::bail!(
                "Unknown config key: {other}. Valid keys: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Every key with its effective value, defaults filled in.
    pub fn effective(&self) -> Vec<(&'static str, String)> {
        vec![
            ("server", self.server.clone().unwrap_or_else(|| DEFAULT_SERVER.to_string())),
            ("format", self.format.clone().unwrap_or_else(|| "table".to_string())),
            ("root_key", self.root_key().to_string()),
            ("use_synonyms", self.use_synonyms().to_string()),
            ("use_views", self.use_views().to_string()),
            ("cqrs", self.cqrs().to_string()),
            ("allow_destructive", self.allow_destructive().to_string()),
            ("timeout_secs", self.timeout_secs().to_string()),
            ("plan_file", self.plan_file().to_string()),
            ("llm_url", self.llm_url().to_string()),
            ("llm_model", self.llm_model().to_string()),
        ]
    }

    pub fn root_key(&self) -> &str {
        self.root_key.as_deref().unwrap_or(DEFAULT_ROOT_KEY)
    }

    pub fn use_synonyms(&self) -> bool {
        self.use_synonyms.unwrap_or(true)
    }

    pub fn use_views(&self) -> bool {
        self.use_views.unwrap_or(true)
    }

    pub fn cqrs(&self) -> bool {
        self.cqrs.unwrap_or(false)
    }

    pub fn allow_destructive(&self) -> bool {
        self.allow_destructive.unwrap_or(false)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn plan_file(&self) -> &str {
        self.plan_file.as_deref().unwrap_or(DEFAULT_PLAN_FILE)
    }

    pub fn llm_url(&self) -> &str {
        self.llm_url.as_deref().unwrap_or(DEFAULT_LLM_URL)
    }

    pub fn llm_model(&self) -> &str {
        self.llm_model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("{key} must be true or false, got {value:?}"),
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

/// `$DBREFACTOR_HOME`, else `~/.dbrefactor`. `None` when neither can be determined.
pub fn home_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DBREFACTOR_HOME").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|h| h.join(".dbrefactor"))
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn load_all(dir: &Path) -> Result<ConfigFile> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all(dir)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(dir)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::create_dir_all(dir)?;
    fs::write(config_path(dir), content)?;
    Ok(())
}

pub fn resolve_server(cli_server: Option<&str>, config: &ProfileConfig) -> String {
    // 1. --server flag / DBREFACTOR_URL env
    if let Some(s) = cli_server.filter(|s| !s.trim().is_empty()) {
        return s.trim_end_matches('/').to_string();
    }
    // 2. config.toml profile
    if let Some(s) = &config.server {
        return s.clone();
    }
    DEFAULT_SERVER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ProfileConfig::default();
        assert_eq!(cfg.root_key(), "SOLUTION");
        assert!(cfg.use_synonyms());
        assert!(cfg.use_views());
        assert!(!cfg.cqrs());
        assert!(!cfg.allow_destructive());
        assert_eq!(cfg.timeout_secs(), 120);
        assert_eq!(cfg.plan_file(), "dbrefactor.plan.json");
    }

    #[test]
    fn test_set_parses_values() {
        let mut cfg = ProfileConfig::default();
        cfg.set("server", "http://db-tools:7040/").unwrap();
        cfg.set("use_views", "no").unwrap();
        cfg.set("timeout_secs", "30").unwrap();
        assert_eq!(cfg.server.as_deref(), Some("http://db-tools:7040"));
        assert_eq!(cfg.use_views, Some(false));
        assert_eq!(cfg.timeout_secs(), 30);

        assert!(cfg.set("cqrs", "maybe").is_err());
        assert!(cfg.set("timeout_secs", "0").is_err());
        assert!(cfg.set("format", "xml").is_err());
        assert!(cfg.set("colour", "red").is_err());
    }

    #[test]
    fn test_profiles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_profile(dir.path(), "default").unwrap(), ProfileConfig::default());

        let mut dev = ProfileConfig::default();
        dev.set("root_key", "shop-api").unwrap();
        save_profile(dir.path(), "dev", &dev).unwrap();

        let mut prod = ProfileConfig::default();
        prod.set("cqrs", "true").unwrap();
        save_profile(dir.path(), "prod", &prod).unwrap();

        assert_eq!(load_profile(dir.path(), "dev").unwrap().root_key(), "shop-api");
        assert!(load_profile(dir.path(), "prod").unwrap().cqrs());
        assert_eq!(load_all(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_server_order() {
        let mut cfg = ProfileConfig::default();
        assert_eq!(resolve_server(None, &cfg), DEFAULT_SERVER);

        cfg.server = Some("http://from-config".to_string());
        assert_eq!(resolve_server(None, &cfg), "http://from-config");
        assert_eq!(resolve_server(Some("http://flag/"), &cfg), "http://flag");
    }
}
