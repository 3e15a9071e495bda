use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;

use crate::errors::{Result, WikiError};

const DEFAULT_CONFIG_FILE: &str = "realms.toml";
const INDEX_FILE_NAME: &str = ".realms-index.json";

/// Search backend used by the search module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Scan the wiki directory on every query
    #[default]
    Simple,
    /// Query an in-memory index built on the first request
    Index,
}

impl std::str::FromStr for SearchType {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(SearchType::Simple),
            "index" => Ok(SearchType::Index),
            other => Err(WikiError::Config(format!("unknown search type '{other}'"))),
        }
    }
}

/// Application configuration and constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modules to discover, in order
    pub modules: Vec<String>,
    /// URL prefix for module routes when not running embedded
    pub relative_path: String,
    pub wiki_path: PathBuf,
    pub static_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub site_title: String,
    pub search_type: SearchType,
    /// Where the `index` search backend persists its pages; defaults to a
    /// hidden file beside the wiki directory
    pub index_path: Option<PathBuf>,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            modules: vec!["wiki".to_string(), "search".to_string()],
            relative_path: "/wiki".to_string(),
            wiki_path: PathBuf::from("wiki"),
            static_path: PathBuf::from("static"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            site_title: "Realms".to_string(),
            search_type: SearchType::Simple,
            index_path: None,
        }
    }

    /// Load configuration from `REALMS_CONFIG`, `./realms.toml` or defaults,
    /// then apply `REALMS_*` environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os("REALMS_CONFIG").map(PathBuf::from);
        let path = explicit.or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::new()
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WikiError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(modules) = lookup("REALMS_MODULES") {
            self.modules = modules
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("REALMS_RELATIVE_PATH") {
            self.relative_path = path;
        }
        if let Some(path) = lookup("REALMS_WIKI_PATH") {
            self.wiki_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("REALMS_STATIC_PATH") {
            self.static_path = PathBuf::from(path);
        }
        if let Some(host) = lookup("REALMS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("REALMS_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| WikiError::Config(format!("invalid port '{port}'")))?;
        }
        if let Some(kind) = lookup("REALMS_SEARCH_TYPE") {
            self.search_type = kind.parse()?;
        }
        if let Some(path) = lookup("REALMS_INDEX_PATH") {
            self.index_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Relative path normalized to `/segment` form, or empty
    pub fn mount_prefix(&self) -> String {
        let trimmed = self.relative_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// File the persisted search index lives in
    pub fn search_index_file(&self) -> PathBuf {
        match &self.index_path {
            Some(path) => path.clone(),
            None => self.wiki_path.with_file_name(INDEX_FILE_NAME),
        }
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| WikiError::Config(format!("invalid listen address {}:{}", self.host, self.port)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            modules = ["search"]
            relative_path = "docs/"
            search_type = "index"
            "#,
        )
        .unwrap();
        assert_eq!(config.modules, vec!["search"]);
        assert_eq!(config.mount_prefix(), "/docs");
        assert_eq!(config.search_type, SearchType::Index);
        assert_eq!(config.port, 5000);
        assert_eq!(config.wiki_path, PathBuf::from("wiki"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::from_toml_str("modules = 3").unwrap_err();
        assert!(matches!(err, WikiError::ConfigParse(_)));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("REALMS_MODULES", "wiki, search ,"),
            ("REALMS_RELATIVE_PATH", ""),
            ("REALMS_PORT", "8080"),
            ("REALMS_SEARCH_TYPE", "Index"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::new();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.modules, vec!["wiki", "search"]);
        assert_eq!(config.mount_prefix(), "");
        assert_eq!(config.port, 8080);
        assert_eq!(config.search_type, SearchType::Index);
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = Config::new();
        let err = config
            .apply_env(|key| (key == "REALMS_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, WikiError::Config(_)));
    }

    #[test]
    fn mount_prefix_forms() {
        let mut config = Config::new();
        for (raw, expected) in [("/wiki", "/wiki"), ("wiki", "/wiki"), ("/a/b/", "/a/b"), ("/", "")] {
            config.relative_path = raw.to_string();
            assert_eq!(config.mount_prefix(), expected, "for {raw:?}");
        }
    }

    #[test]
    fn index_file_sits_beside_wiki() {
        let mut config = Config::new();
        config.wiki_path = PathBuf::from("/srv/site/wiki");
        assert_eq!(config.search_index_file(), PathBuf::from("/srv/site/.realms-index.json"));

        config
            .apply_env(|key| (key == "REALMS_INDEX_PATH").then(|| "/var/cache/idx.json".to_string()))
            .unwrap();
        assert_eq!(config.search_index_file(), PathBuf::from("/var/cache/idx.json"));
    }

    #[test]
    fn socket_addr_parses() {
        let config = Config::new();
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
    }
}
