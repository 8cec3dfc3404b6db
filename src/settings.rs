//! Application settings
//!
//! Read from `settings.toml` in the platform config directory, then
//! overridden by environment variables (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "settings.toml";
pub const MEMORY_DATABASE: &str = ":memory:";

const ENV_DISABLED_MARKETPLACES: &str = "CHANNEL_LISTER_DISABLED_MARKETPLACES";
const ENV_UPC_PREFIXES: &str = "CHANNEL_LISTER_UPC_PREFIXES";
const ENV_DB_CONNECTION: &str = "CHANNEL_LISTER_DB_CONNECTION";
const ENV_SEARCH_BASE_URL: &str = "CHANNEL_LISTER_SEARCH_BASE_URL";
const ENV_SP_API_CLIENT_ID: &str = "AMAZON_SP_API_CLIENT_ID";
const ENV_SP_API_CLIENT_SECRET: &str = "AMAZON_SP_API_CLIENT_SECRET";
const ENV_SP_API_REFRESH_TOKEN: &str = "AMAZON_SP_API_REFRESH_TOKEN";
const ENV_SP_API_REGION: &str = "AMAZON_SP_API_REGION";
const ENV_SP_API_MARKETPLACE_ID: &str = "AMAZON_SP_API_MARKETPLACE_ID";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("failed to read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings")]
    Serialize(#[from] toml::ser::Error),

    #[error("database connection '{0}' is not configured")]
    UnknownConnection(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

impl ConnectionSettings {
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_DATABASE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Name of the entry in `connections` to use
    pub connection: String,
    pub connections: BTreeMap<String, ConnectionSettings>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let path = Settings::config_dir()
            .map(|dir| dir.join("channel-lister.db").display().to_string())
            .unwrap_or_else(|_| "channel-lister.db".to_string());

        let mut connections = BTreeMap::new();
        connections.insert("sqlite".to_string(), ConnectionSettings { path });
        connections.insert(
            "memory".to_string(),
            ConnectionSettings { path: MEMORY_DATABASE.to_string() },
        );

        Self {
            connection: "sqlite".to_string(),
            connections,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmazonSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub region: String,
    pub marketplace_id: String,
    /// Keep the access token in the database between runs
    pub persist_token: bool,
}

impl Default for AmazonSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            region: "na".to_string(),
            marketplace_id: "ATVPDKIKX0DER".to_string(),
            persist_token: true,
        }
    }
}

impl std::fmt::Debug for AmazonSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AmazonSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("region", &self.region)
            .field("marketplace_id", &self.marketplace_id)
            .field("persist_token", &self.persist_token)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Host application serving the category endpoints
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub disabled_marketplaces: Vec<String>,
    pub upc_prefixes: Vec<String>,
    pub database: DatabaseSettings,
    pub amazon: AmazonSettings,
    pub search: SearchSettings,
}

impl Settings {
    pub fn config_dir() -> Result<PathBuf, SettingsError> {
        let dir = if cfg!(target_os = "linux") {
            dirs::config_dir().ok_or(SettingsError::NoConfigDir)?.join("channel-lister")
        } else {
            dirs::home_dir().ok_or(SettingsError::NoConfigDir)?.join(".channel-lister")
        };
        Ok(dir)
    }

    pub fn default_path() -> Result<PathBuf, SettingsError> {
        Ok(Self::config_dir()?.join(SETTINGS_FILE))
    }

    /// Settings file (if present) plus `.env` and process environment overrides
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let path = Self::default_path()?;
        let mut settings = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::debug!("No settings file at {}, using defaults", path.display());
            Self::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup`, which maps an environment variable name to its value
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get(ENV_DISABLED_MARKETPLACES) {
            self.disabled_marketplaces = parse_list(&value);
        }
        if let Some(value) = get(ENV_UPC_PREFIXES) {
            self.upc_prefixes = parse_list(&value);
        }
        if let Some(value) = get(ENV_DB_CONNECTION) {
            self.database.connection = value;
        }
        if let Some(value) = get(ENV_SEARCH_BASE_URL) {
            self.search.base_url = Some(value);
        }
        if let Some(value) = get(ENV_SP_API_CLIENT_ID) {
            self.amazon.client_id = Some(value);
        }
        if let Some(value) = get(ENV_SP_API_CLIENT_SECRET) {
            self.amazon.client_secret = Some(value);
        }
        if let Some(value) = get(ENV_SP_API_REFRESH_TOKEN) {
            self.amazon.refresh_token = Some(value);
        }
        if let Some(value) = get(ENV_SP_API_REGION) {
            self.amazon.region = value;
        }
        if let Some(value) = get(ENV_SP_API_MARKETPLACE_ID) {
            self.amazon.marketplace_id = value;
        }
    }

    /// The configured named database connection
    pub fn database_connection(&self) -> Result<&ConnectionSettings, SettingsError> {
        self.database
            .connections
            .get(&self.database.connection)
            .ok_or_else(|| SettingsError::UnknownConnection(self.database.connection.clone()))
    }

    /// Write these settings to `path`. Returns false without touching an
    /// existing file unless `force` is set.
    pub fn write_to(&self, path: &Path, force: bool) -> Result<bool, SettingsError> {
        if path.exists() && !force {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Wrote settings to {}", path.display());
        Ok(true)
    }
}

/// Split a comma-separated setting into trimmed, non-empty entries
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
