//! Server configuration
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! environment variables, then command-line flags (applied by the binary).

use std::path::{Path, PathBuf};

use generator::GeneratorConfig;
use github::DEFAULT_PAGES_DOMAIN;
use orchestrator::{DEFAULT_MAX_ROUNDS, DEFAULT_NOTIFY_TIMEOUT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 10000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub token: String,
    /// API root for GitHub Enterprise; api.github.com when unset.
    pub api_url: Option<String>,
    pub pages_domain: String,
    /// Branch the static site serves; each repository's default branch when unset.
    pub pages_branch: Option<String>,
    pub private_repos: bool,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: None,
            pages_domain: DEFAULT_PAGES_DOMAIN.to_string(),
            pages_branch: None,
            private_repos: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub secret: String,
    /// SQLite URL for persistent records; records live in memory when unset.
    pub database_url: Option<String>,
    pub max_rounds: usize,
    pub notify_timeout_secs: u64,
    pub github: GitHubSettings,
    pub llm: GeneratorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secret: String::new(),
            database_url: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            notify_timeout_secs: DEFAULT_NOTIFY_TIMEOUT.as_secs(),
            github: GitHubSettings::default(),
            llm: GeneratorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid with `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies environment overrides read through `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(secret) = get("SECRET_KEY") {
            self.secret = secret;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = Some(url);
        }
        if let Some(key) = get("OPENAI_API_KEY").or_else(|| get("AIPIPE_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(branch) = get("PAGES_BRANCH") {
            self.github.pages_branch = Some(branch);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: port,
            })?;
        }

        Ok(())
    }

    /// Rejects configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Missing("SECRET_KEY"));
        }
        if self.github.token.trim().is_empty() {
            return Err(ConfigError::Missing("GITHUB_TOKEN"));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                name: "max_rounds",
                value: self.max_rounds.to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
