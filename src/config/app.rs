//! Application settings loaded from an optional `config.toml` with environment overrides.
//!
//! The file is looked up at `BRAINIX_CONFIG` (default `config.toml`). A missing file is
//! not an error: every setting has a default, and the environment variables listed on
//! each field take precedence over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Identity header settings for the hosted auth provider
    pub auth: AuthConfig,
    /// Chatbot settings (cache and language model)
    pub chat: ChatConfig,
}

/// HTTP server settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind (`BIND_ADDRESS`)
    pub bind_address: String,
    /// Origins allowed by CORS; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Database settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL (`DATABASE_URL`)
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/brainix.sqlite?mode=rwc".to_string(),
        }
    }
}

/// Identity header settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the authenticated subject (`AUTH_USER_HEADER`)
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
        }
    }
}

/// Chatbot settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Redis URL for the reply cache (`REDIS_URL`); in-memory cache when unset
    pub redis_url: Option<String>,
    /// Seconds a cached reply stays valid (`CHAT_CACHE_TTL_SECS`)
    pub cache_ttl_secs: u64,
    /// Base URL of the generative-language API
    pub llm_base_url: String,
    /// Model name (`GEMINI_MODEL`)
    pub llm_model: String,
    /// API key (`GEMINI_API_KEY`)
    pub llm_api_key: Option<String>,
    /// Request timeout for the language model in seconds
    pub llm_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_ttl_secs: 3600,
            llm_base_url: "https://generativelanguage.googleapis.com".to_string(),
            llm_model: "gemini-1.5-flash".to_string(),
            llm_api_key: None,
            llm_timeout_secs: 20,
        }
    }
}

/// Parses configuration from a TOML file.
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path_ref:?}: {e}"),
    })
}

fn parse_config(contents: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    let mut config: AppConfig = toml::from_str(contents)?;
    // Header lookups are case-sensitive on the lower-cased name
    config.auth.user_header = config.auth.user_header.to_ascii_lowercase();
    Ok(config)
}

/// Loads the application configuration: file (if present) then environment overrides.
///
/// # Errors
/// Returns `Error::Config` if the file exists but is invalid, or if a numeric
/// environment override cannot be parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("BRAINIX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        warn!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    info!(
        "Configuration loaded (bind: {}, redis cache: {})",
        config.server.bind_address,
        config.chat.redis_url.is_some()
    );
    Ok(config)
}

/// Applies environment overrides using `lookup` as the variable source.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(address) = lookup("BIND_ADDRESS") {
        config.server.bind_address = address;
    }
    if let Some(header) = lookup("AUTH_USER_HEADER") {
        config.auth.user_header = header.to_ascii_lowercase();
    }
    if let Some(url) = lookup("REDIS_URL").filter(|u| !u.trim().is_empty()) {
        config.chat.redis_url = Some(url);
    }
    if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.chat.llm_api_key = Some(key);
    }
    if let Some(model) = lookup("GEMINI_MODEL") {
        config.chat.llm_model = model;
    }
    if let Some(ttl) = lookup("CHAT_CACHE_TTL_SECS") {
        config.chat.cache_ttl_secs = ttl.parse().map_err(|e| Error::Config {
            message: format!("Invalid CHAT_CACHE_TTL_SECS '{ttl}': {e}"),
        })?;
    }
    Ok(())
}
