use thiserror::Error;

/// Errors raised while talking to the LM gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response
    #[error("gateway request failed: {0}")]
    Transport(String),

    /// The gateway answered with a non-success status
    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid completion
    #[error("failed to decode gateway response: {0}")]
    Decode(String),

    /// The event stream broke mid-response
    #[error("gateway stream error: {0}")]
    Stream(String),
}
