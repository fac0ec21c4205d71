//! Configuration schema (pgconverge.toml)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TLS mode for the catalog connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain TCP
    #[default]
    Disable,

    /// TLS required
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "allow" | "prefer" => Ok(Self::Disable),
            "require" | "verify-ca" | "verify-full" => Ok(Self::Require),
            other => Err(ConfigError::ParseError(format!("unknown sslmode '{}'", other))),
        }
    }
}

/// Catalog connection settings
///
/// Fields left unset are filled from the libpq environment variables
/// (`PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`, `PGSSLMODE`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<SslMode>,

    /// Raw connection string; takes precedence over the individual fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl ConnectionConfig {
    /// Fill unset fields from the process environment
    pub fn fill_from_env(&mut self) -> Result<(), ConfigError> {
        self.fill_from(|key| std::env::var(key).ok())
    }

    /// Fill unset fields using a variable lookup
    pub fn fill_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if self.host.is_none() {
            self.host = lookup("PGHOST");
        }
        if self.port.is_none() {
            if let Some(port) = lookup("PGPORT") {
                let port = port.parse()
                    .map_err(|_| ConfigError::ParseError(format!("invalid PGPORT '{}'", port)))?;
                self.port = Some(port);
            }
        }
        if self.database.is_none() {
            self.database = lookup("PGDATABASE");
        }
        if self.user.is_none() {
            self.user = lookup("PGUSER");
        }
        if self.password.is_none() {
            self.password = lookup("PGPASSWORD");
        }
        if self.sslmode.is_none() {
            if let Some(mode) = lookup("PGSSLMODE") {
                self.sslmode = Some(mode.parse()?);
            }
        }
        Ok(())
    }

    /// Effective TLS mode
    pub fn ssl_mode(&self) -> SslMode {
        self.sslmode.unwrap_or_default()
    }

    /// Render a key/value connection string for tokio-postgres
    pub fn to_connection_string(&self) -> String {
        if let Some(conn_str) = &self.connection_string {
            return conn_str.clone();
        }

        let mut parts = vec![
            format!("host={}", quote_value(self.host.as_deref().unwrap_or("localhost"))),
            format!("port={}", self.port.unwrap_or(5432)),
        ];
        if let Some(database) = &self.database {
            parts.push(format!("dbname={}", quote_value(database)));
        }
        if let Some(user) = &self.user {
            parts.push(format!("user={}", quote_value(user)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_value(password)));
        }
        parts.join(" ")
    }
}

/// Quote a connection string value when it is empty or contains spaces or quotes
fn quote_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog connection
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Directory holding per-resource state files, relative to the project root
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".pgconverge")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            state_dir: default_state_dir(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Absolute state directory
    pub fn state_path(&self) -> PathBuf {
        self.project_root.join(&self.state_dir)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
