use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Gateway URL used when none is configured
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000/inference/v1";

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Credential sent to the gateway when a request carries no token
pub const DEFAULT_CREDENTIAL: &str = "bridge-internal";

/// Language-model gateway configuration
///
/// The gateway is an OpenAI-compatible endpoint. Every LM call made by a
/// reasoning module is sent there with the per-request model and credential.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Model used when the request omits `model`
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Credential used when the request carries no bearer token
    #[serde(default = "default_api_key")]
    pub api_key: SecretString,
    /// Sampling temperature forwarded on every LM call
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Completion token cap forwarded on every LM call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            api_key: default_api_key(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[allow(clippy::missing_panics_doc)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_GATEWAY_URL).expect("valid default URL")
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

fn default_api_key() -> SecretString {
    SecretString::from(DEFAULT_CREDENTIAL)
}

#[allow(clippy::missing_const_for_fn)]
fn default_temperature() -> f64 {
    0.7
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_tokens() -> u32 {
    4096
}
