use std::sync::Arc;

use loom_config::{EngineConfig, GatewayConfig};
use loom_engine::LanguageModel;
use loom_gateway::GatewayClient;
use secrecy::SecretString;

use crate::dispatch::Dispatcher;

/// Shared, read-only state of the bridge handlers
#[derive(Clone)]
pub struct BridgeState {
    pub(crate) inner: Arc<BridgeStateInner>,
}

pub(crate) struct BridgeStateInner {
    pub(crate) gateway: GatewayClient,
    pub(crate) config: GatewayConfig,
    pub(crate) dispatcher: Dispatcher,
}

impl BridgeState {
    pub fn new(gateway: &GatewayConfig, engine: &EngineConfig) -> Self {
        Self {
            inner: Arc::new(BridgeStateInner {
                gateway: GatewayClient::new(gateway.base_url.clone()),
                config: gateway.clone(),
                dispatcher: Dispatcher::from(engine),
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Model handle for one invocation
    ///
    /// An absent or empty model selects the configured default; an absent
    /// credential selects the configured internal one.
    pub fn language_model(&self, model: Option<&str>, credential: Option<SecretString>) -> LanguageModel {
        let config = &self.inner.config;
        let model = model.filter(|m| !m.trim().is_empty()).unwrap_or(&config.default_model);

        LanguageModel::new(
            self.inner.gateway.clone(),
            model,
            credential.unwrap_or_else(|| config.api_key.clone()),
        )
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
    }

    /// Configured default model name
    pub fn default_model(&self) -> &str {
        &self.inner.config.default_model
    }
}

impl std::fmt::Debug for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeState")
            .field("gateway", self.inner.gateway.base_url())
            .field("default_model", &self.inner.config.default_model)
            .finish_non_exhaustive()
    }
}
