use crate::domain::entities::DEFAULT_LOCK_TIMEOUT_MS;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockStoreKind {
    Sqlite,
    Memory,
}

impl FromStr for LockStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(LockStoreKind::Sqlite),
            "memory" => Ok(LockStoreKind::Memory),
            other => Err(ConfigError::InvalidLockStore(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub lock_store: LockStoreKind,
    pub server_host: String,
    pub server_port: u16,
    pub import_lock_timeout_ms: i64,
    /// Zero disables the background sweeper.
    pub sweep_interval_secs: u64,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://pantry.db?mode=rwc".to_string(),
            lock_store: LockStoreKind::Sqlite,
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            import_lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            sweep_interval_secs: 0,
            otel_exporter_endpoint: None,
            service_name: "pantry".to_string(),
            metrics_port: 9000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let lock_store = match lookup("LOCK_STORE") {
            Some(value) => value.parse()?,
            None => defaults.lock_store,
        };

        let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);

        let server_port = match lookup("SERVER_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.server_port,
        };

        let import_lock_timeout_ms = match lookup("IMPORT_LOCK_TIMEOUT_MS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidLockTimeout(value))?,
            None => defaults.import_lock_timeout_ms,
        };

        let sweep_interval_secs = match lookup("SWEEP_INTERVAL_SECS") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidSweepInterval(value))?,
            None => defaults.sweep_interval_secs,
        };

        let otel_exporter_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT");

        let service_name = lookup("SERVICE_NAME").unwrap_or(defaults.service_name);

        let metrics_port = match lookup("METRICS_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.metrics_port,
        };

        Ok(Config {
            database_url,
            lock_store,
            server_host,
            server_port,
            import_lock_timeout_ms,
            sweep_interval_secs,
            otel_exporter_endpoint,
            service_name,
            metrics_port,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("IMPORT_LOCK_TIMEOUT_MS must be a positive integer, got {0:?}")]
    InvalidLockTimeout(String),

    #[error("SWEEP_INTERVAL_SECS must be a non-negative integer, got {0:?}")]
    InvalidSweepInterval(String),

    #[error("LOCK_STORE must be 'sqlite' or 'memory', got {0:?}")]
    InvalidLockStore(String),
}
