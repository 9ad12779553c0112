// Runtime configuration
// Values come from the process environment (optionally seeded from .env)

use std::env;

/// Where sale audit events are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSink {
    /// Structured tracing events only
    Log,
    /// Rows in the `sale_audit_log` table
    Database,
}

impl AuditSink {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "log" => Some(AuditSink::Log),
            "database" | "db" => Some(AuditSink::Database),
            _ => None,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Connection pool size
    pub max_connections: u32,
    /// Audit event destination
    pub audit_sink: AuditSink,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?;

        let audit_sink = match lookup("AUDIT_SINK") {
            Some(value) => AuditSink::parse(&value)
                .ok_or_else(|| ConfigError::InvalidValue("AUDIT_SINK".to_string()))?,
            None => AuditSink::Log,
        };

        Ok(Config {
            database_url,
            host,
            port,
            max_connections,
            audit_sink,
        })
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
