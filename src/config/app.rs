//! Main application configuration
//!
//! This module defines the primary configuration structures for the triage
//! service, including file and environment variable loading and validation.

use crate::config::store::StoreBackend;
use crate::error::TriageError;
use crate::types::{PriorityInfo, PriorityTier};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub store: StoreSettings,
    pub triage: TriageSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP API binds to
    pub http_host: String,
    /// Port for the HTTP API (triage, health and metrics endpoints)
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Patient store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Which store implementation to open
    pub backend: StoreBackend,
    /// Database URL for the sqlite backend
    pub url: String,
    /// Connection pool size for the sqlite backend
    pub max_connections: u32,
}

/// Per-tier service time estimates seeded into the priority table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageSettings {
    pub critical_service_minutes: u32,
    pub urgent_service_minutes: u32,
    pub non_urgent_service_minutes: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "triage-desk".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "sqlite://triage.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            critical_service_minutes: 30,
            urgent_service_minutes: 20,
            non_urgent_service_minutes: 10,
        }
    }
}

impl TriageSettings {
    /// Configured service estimate for a tier
    pub fn service_minutes_for(&self, tier: &PriorityTier) -> Option<u32> {
        match tier {
            PriorityTier::Critical => Some(self.critical_service_minutes),
            PriorityTier::Urgent => Some(self.urgent_service_minutes),
            PriorityTier::NonUrgent => Some(self.non_urgent_service_minutes),
            PriorityTier::Unrecognized(_) => None,
        }
    }

    /// Rows of the priority table, keyed by the tier's priority id
    pub fn priority_table(&self) -> Vec<PriorityInfo> {
        PriorityTier::known()
            .into_iter()
            .filter_map(|tier| {
                let id = tier.priority_id()?;
                Some(PriorityInfo {
                    id,
                    approx_service_minutes: self.service_minutes_for(&tier),
                    tier,
                })
            })
            .collect()
    }
}

/// Read an environment variable and parse it, naming the variable on failure
fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| {
                TriageError::configuration(format!("Invalid {} value: {}", key, value)).into()
            }),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            config.service.http_host = host;
        }
        if let Some(port) = parse_env("HTTP_PORT")? {
            config.service.http_port = port;
        }
        if let Some(timeout) = parse_env("SHUTDOWN_TIMEOUT_SECONDS")? {
            config.service.shutdown_timeout_seconds = timeout;
        }

        // Store settings
        if let Some(backend) = parse_env("STORE_BACKEND")? {
            config.store.backend = backend;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.store.url = url;
        }
        if let Some(max) = parse_env("STORE_MAX_CONNECTIONS")? {
            config.store.max_connections = max;
        }

        // Triage settings
        if let Some(minutes) = parse_env("CRITICAL_SERVICE_MINUTES")? {
            config.triage.critical_service_minutes = minutes;
        }
        if let Some(minutes) = parse_env("URGENT_SERVICE_MINUTES")? {
            config.triage.urgent_service_minutes = minutes;
        }
        if let Some(minutes) = parse_env("NON_URGENT_SERVICE_MINUTES")? {
            config.triage.non_urgent_service_minutes = minutes;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Socket address the HTTP API listens on. Host names are resolved and
    /// the first address returned wins.
    pub fn http_addr(&self) -> Result<SocketAddr> {
        let host = self.service.http_host.as_str();
        let resolve_error = |reason: String| {
            TriageError::configuration(format!(
                "Invalid HTTP listen address {}:{}: {}",
                host, self.service.http_port, reason
            ))
        };

        let mut addrs = (host, self.service.http_port)
            .to_socket_addrs()
            .map_err(|e| resolve_error(e.to_string()))?;
        addrs
            .next()
            .ok_or_else(|| resolve_error("host resolved to no addresses".to_string()).into())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(config_error(format!("Invalid log level: {}", config.service.log_level))),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(config_error("HTTP port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(config_error("Shutdown timeout must be greater than 0"));
    }

    // Validate store settings
    if config.store.backend == StoreBackend::Sqlite && config.store.url.is_empty() {
        return Err(config_error("Database URL cannot be empty for the sqlite store"));
    }
    if config.store.max_connections == 0 {
        return Err(config_error("Store max connections must be greater than 0"));
    }

    // The listen address must resolve before startup
    config.http_addr()?;

    Ok(())
}

fn config_error(message: impl Into<String>) -> anyhow::Error {
    TriageError::configuration(message).into()
}
