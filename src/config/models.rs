// src/config/models.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::broker::ConnectParams;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub health: HealthCheckConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,

    // Dependencies are optional: an absent section means the dependency is
    // not configured and contributes nothing to the health report.
    pub store: Option<StoreConfig>,
    pub cache: Option<CacheConfig>,
    pub broker: Option<BrokerConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.health.probe_timeout_secs == 0 {
            bail!("health.probe_timeout_secs must be greater than zero");
        }
        if !self.metrics.path.starts_with('/') {
            bail!("metrics.path must start with '/'");
        }
        if let Some(broker) = &self.broker {
            if broker.retry_interval_secs == 0 {
                bail!("broker.retry_interval_secs must be greater than zero");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheckConfig {
    /// Upper bound for a single dependency probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl HealthCheckConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    /// Fixed pause between reconnection attempts.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

impl BrokerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn params(&self) -> ConnectParams {
        ConnectParams {
            host: self.host.clone(),
            port: self.port.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            vhost: self.vhost.clone(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_retry_interval_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_connections() -> u32 {
    5
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_vhost() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(yaml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("{}");
        config.validate().unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.health.probe_timeout(), Duration::from_secs(5));
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.path, "/metrics");
        assert!(config.store.is_none());
        assert!(config.cache.is_none());
        assert!(config.broker.is_none());
    }

    #[test]
    fn broker_section_parses_with_defaults() {
        let config = parse(
            r#"
            broker:
              host: rabbit.internal
              port: "5672"
              user: guest
              password: guest
            "#,
        );
        config.validate().unwrap();

        let broker = config.broker.unwrap();
        assert_eq!(broker.vhost, "/");
        assert_eq!(broker.retry_interval(), Duration::from_secs(5));

        let params = broker.params();
        assert_eq!(params.host, "rabbit.internal");
        assert_eq!(params.user, "guest");
    }

    #[test]
    fn zero_probe_timeout_is_rejected() {
        let config = parse("health:\n  probe_timeout_secs: 0\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn metrics_path_must_be_absolute() {
        let config = parse("metrics:\n  path: metrics\n");
        assert!(config.validate().is_err());
    }
}
