//! Application configuration.
//!
//! Layered exactly as the teacher's config module: a base file, an
//! environment-specific file, then environment variables (`STRATA__`
//! prefix, `__` as the nesting separator) take precedence, all folded
//! through the `config` crate into one `Config` struct.
//!
//! `LOG_LEVEL`/`LOG_TYPE` are read directly from the process environment at
//! tracing-initialization time (see `crate::telemetry`), not through this
//! layered loader — the core's external-interfaces section names them as
//! bare environment variables, not `STRATA__`-prefixed settings.

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub infrastructure: InfrastructureConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Execution-mode and messaging configuration for the Infrastructure
/// Service, Task Monitoring Service, and Infrastructure Messaging Service.
#[derive(Debug, Clone, Deserialize)]
pub struct InfrastructureConfig {
    pub async_messaging_enabled: bool,
    pub request_queue: RequestQueueConfig,
    pub topics: TopicsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestQueueConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicsConfig {
    pub infrastructure_task_events: Option<TopicConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    pub name: Option<String>,
}

impl Config {
    /// Load configuration from `config/default.{yaml,toml,...}`, an
    /// environment-specific overlay, then `STRATA__`-prefixed environment
    /// variables, in that order of increasing precedence.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::File::with_name(&format!("config/environments/{environment}")).required(false),
            )
            .add_source(config::Environment::with_prefix("STRATA").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            infrastructure: InfrastructureConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            async_messaging_enabled: false,
            request_queue: RequestQueueConfig { enabled: false },
            topics: TopicsConfig {
                infrastructure_task_events: Some(TopicConfig {
                    name: Some("infrastructure_task_events".to_string()),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_address_joins_host_and_port() {
        let cfg = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(cfg.address(), "127.0.0.1:9000");
    }

    #[test]
    fn default_infrastructure_config_is_sync_mode_with_a_named_topic() {
        let cfg = InfrastructureConfig::default();
        assert!(!cfg.async_messaging_enabled);
        assert!(!cfg.request_queue.enabled);
        assert_eq!(
            cfg.topics.infrastructure_task_events.unwrap().name.as_deref(),
            Some("infrastructure_task_events")
        );
    }
}
