//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use loom_config::{Config, EngineConfig, GatewayConfig, HealthConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                },
                gateway: GatewayConfig::default(),
                engine: EngineConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Point the bridge at a mock gateway
    pub fn with_gateway(mut self, base_url: &str) -> Self {
        self.config.gateway.base_url = base_url.parse().expect("valid URL");
        self
    }

    /// Build an engine without the reflective module
    pub fn without_reflective(mut self) -> Self {
        self.config.engine.reflective = false;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
