//! Runtime configuration: a TOML file with per-field defaults, overridable
//! through `LINGUA_*` environment variables.

use lingua_gateway::GatewayConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level configuration tree, one section per concern.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log filtering and output format.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session token settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// External AI gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Static web client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// SQLite file location and pool behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Per-connection busy timeout, milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Pool size ceiling.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Log filtering and output format.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string, e.g. `info` or `lingua_server=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

/// Session token configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify session tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

/// Static web client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Directory holding the built web client, served as a fallback when
    /// `dir/index.html` exists.
    #[serde(default = "default_client_dir")]
    pub dir: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "lingua.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_client_dir() -> String {
    "client/dist".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dir: default_client_dir(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, then applies environment overrides.
///
/// A missing file is not an error — every field has a default — but a file
/// that exists and fails to read or parse is.
///
/// Recognized overrides:
/// - `LINGUA_HOST` / `LINGUA_PORT` → `server.host` / `server.port`
/// - `LINGUA_DB_PATH` → `database.path`
/// - `LINGUA_LOG_LEVEL` / `LINGUA_LOG_JSON` → `logging.level` / `logging.json`
/// - `LINGUA_JWT_SECRET` → `auth.jwt_secret`
/// - `LINGUA_GATEWAY_URL` → `gateway.base_url`
/// - `OPENAI_API_KEY` → `gateway.api_key`
/// - `LINGUA_CLIENT_DIR` → `client.dir`
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => read_config_file(p)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path, "config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(ConfigError::FileRead(e)),
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(host) = env_override("LINGUA_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = host;
    }
    if let Some(port) = env_override("LINGUA_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Some(path) = env_override("LINGUA_DB_PATH") {
        config.database.path = path;
    }
    if let Some(level) = env_override("LINGUA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env_override("LINGUA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(secret) = env_override("LINGUA_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(url) = env_override("LINGUA_GATEWAY_URL") {
        config.gateway.base_url = url;
    }
    if let Some(key) = env_override("OPENAI_API_KEY") {
        config.gateway.api_key = key;
    }
    if let Some(dir) = env_override("LINGUA_CLIENT_DIR") {
        config.client.dir = dir;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/definitely/not/a/real/config.toml"))
            .expect("missing file should not be an error");
        assert_eq!(config.server.port, default_port());
        assert_eq!(config.database.path, "lingua.db");
        assert_eq!(config.gateway.chat_model, "gpt-4");
    }

    #[test]
    fn sections_parse_from_toml() {
        let config: Config = toml::from_str(
            "[server]\nport = 8080\n\n[auth]\njwt_secret = \"s3\"\n\n[gateway]\nvoice = \"nova\"\n",
        )
        .expect("parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret, "s3");
        assert_eq!(config.gateway.voice, "nova");
        // Untouched sections keep their defaults.
        assert_eq!(config.database.pool_max_size, default_pool_max_size());
    }

    #[test]
    fn debug_redacts_jwt_secret() {
        let config = Config::default();
        let debug = format!("{config:?}");
        assert!(!debug.contains("change-me"));
        assert!(debug.contains("[REDACTED]"));
    }
}
