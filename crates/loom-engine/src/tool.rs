//! Tools a tool-using module may call

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request for an external runner to execute a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallIntent {
    /// Identifier correlating the call with its eventual result
    pub id: String,
    /// Name of the tool to run
    pub name: String,
    /// Arguments chosen by the model
    pub args: Map<String, Value>,
}

impl ToolCallIntent {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            args,
        }
    }
}

/// Result of calling a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool ran; its output is fed back to the model
    Observation(String),
    /// The tool must run elsewhere; the module stops and surfaces the intent
    Deferred(ToolCallIntent),
}

/// A callable tool with self-describing metadata
#[async_trait]
pub trait Tool: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments
    fn schema(&self) -> &Value;

    async fn call(&self, args: Map<String, Value>) -> ToolOutcome;
}
