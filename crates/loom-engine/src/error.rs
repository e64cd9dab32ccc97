use loom_gateway::GatewayError;
use thiserror::Error;

/// Errors raised while running a reasoning module
#[derive(Debug, Error)]
pub enum EngineError {
    /// The LM call through the gateway failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The signature string could not be parsed
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The model's reply did not contain the expected fields
    #[error("failed to parse model output: {0}")]
    Adapter(String),

    /// The consumer of a streaming run went away
    #[error("stream consumer disconnected")]
    Cancelled,

    /// The module panicked while running
    #[error("module panicked: {0}")]
    Panicked(String),
}
