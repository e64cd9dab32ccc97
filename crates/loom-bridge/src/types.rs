//! Wire types of the `/invoke` endpoint

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dispatch::ModuleKind;

const DEFAULT_SIGNATURE: &str = "question -> answer";

fn default_signature() -> String {
    DEFAULT_SIGNATURE.to_owned()
}

/// Body of `POST /invoke`
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationRequest {
    /// Requested module kind, kept raw so unknown kinds surface at dispatch
    #[serde(default = "ModuleKind::default_name")]
    pub kind: String,
    #[serde(default = "default_signature")]
    pub signature: String,
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    /// Target model; the configured default when absent or empty
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: bool,
    /// Gateway credential; takes precedence over the upstream header
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// A tool the module may ask the caller to run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: Map<String, Value>,
}

/// Tool call the caller is expected to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Map<String, Value>,
}

impl From<loom_engine::ToolCallIntent> for ToolCall {
    fn from(intent: loom_engine::ToolCallIntent) -> Self {
        Self {
            id: intent.id,
            name: intent.name,
            args: intent.args,
        }
    }
}

/// Result of a non-streaming invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub outputs: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// One normalized frame of a streaming invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text of one output field
    Chunk { field: String, text: String },
    /// Progress or diagnostics, not part of the result
    Status { message: String },
    /// A deferred tool invocation
    ToolCall(ToolCall),
    /// The complete output set
    Prediction { outputs: IndexMap<String, String> },
}

impl StreamEvent {
    pub fn chunk(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Chunk {
            field: field.into(),
            text: text.into(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }
}
