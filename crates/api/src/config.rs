//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use gateway::{GatewayConfig, RetryPolicy};
use pipeline::{PipelineConfig, ProvisioningPolicy};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Messaging provider base URL.
    pub gateway_url: String,
    /// Messaging provider API key.
    pub gateway_api_key: Option<String>,
    /// Timeout for one provider request.
    pub gateway_timeout: Duration,
    /// Retries for transient provider failures.
    pub gateway_max_retries: u32,
    /// Messages fetched per chat sync.
    pub sync_page_size: u32,
    /// Provision unknown accounts into the first workspace.
    pub allow_workspace_fallback: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SWITCHBOARD_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:switchboard.db?mode=rwc` |
    /// | `GATEWAY_URL` | Messaging provider base URL | (required) |
    /// | `GATEWAY_API_KEY` | Messaging provider API key | (none) |
    /// | `GATEWAY_TIMEOUT_SECS` | Timeout for one provider request | `30` |
    /// | `GATEWAY_MAX_RETRIES` | Retries for transient provider failures | `3` |
    /// | `SYNC_PAGE_SIZE` | Messages fetched per chat sync | `50` |
    /// | `ALLOW_WORKSPACE_FALLBACK` | Auto-provision unknown accounts | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SWITCHBOARD_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = lookup("SQLITE_PATH")
            .unwrap_or_else(|| "sqlite:switchboard.db?mode=rwc".to_string());

        let gateway_url = lookup("GATEWAY_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingGatewayUrl)?;

        let gateway_api_key = lookup("GATEWAY_API_KEY").filter(|key| !key.is_empty());

        let timeout_secs: u64 = parse_or(&lookup, "GATEWAY_TIMEOUT_SECS", 30)?;
        let gateway_max_retries = parse_or(&lookup, "GATEWAY_MAX_RETRIES", 3)?;
        let sync_page_size = parse_or(&lookup, "SYNC_PAGE_SIZE", 50)?;
        let allow_workspace_fallback = parse_bool(&lookup, "ALLOW_WORKSPACE_FALLBACK")?;

        Ok(Self {
            addr,
            database_url,
            gateway_url,
            gateway_api_key,
            gateway_timeout: Duration::from_secs(timeout_secs),
            gateway_max_retries,
            sync_page_size,
            allow_workspace_fallback,
        })
    }

    /// Settings for the provider HTTP client.
    pub fn gateway_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(&self.gateway_url).with_timeout(self.gateway_timeout);
        match &self.gateway_api_key {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }

    /// Retry settings for the provider client.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.gateway_max_retries)
    }

    /// Time budget for one provider operation: every retry attempt plus the
    /// backoff between them.
    pub fn operation_timeout(&self) -> Duration {
        self.retry_policy().operation_budget(self.gateway_timeout)
    }

    /// Settings for the sync engine and outbound coordinator.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let provisioning = if self.allow_workspace_fallback {
            ProvisioningPolicy::FirstAvailableWorkspace
        } else {
            ProvisioningPolicy::RequireBinding
        };

        PipelineConfig::default()
            .with_page_size(self.sync_page_size)
            .with_gateway_timeout(self.operation_timeout())
            .with_provisioning(provisioning)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SWITCHBOARD_ADDR format")]
    InvalidAddr,

    #[error("GATEWAY_URL environment variable is required")]
    MissingGatewayUrl,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
