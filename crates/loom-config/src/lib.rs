#![allow(clippy::must_use_candidate)]

pub mod engine;
mod env;
pub mod gateway;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use engine::*;
pub use gateway::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level bridge configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Language-model gateway the bridge routes every LM call through
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Reasoning engine capabilities and limits
    #[serde(default)]
    pub engine: EngineConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
