//! Tool descriptors as deferred engine tools

use std::sync::Arc;

use async_trait::async_trait;
use loom_engine::{Tool, ToolCallIntent, ToolOutcome};
use serde_json::{Map, Value};

use crate::types::ToolDescriptor;

/// A tool that never runs locally
///
/// Calling it yields a [`ToolOutcome::Deferred`] intent carrying the tool's
/// name and the model's arguments, for an external runner to execute.
#[derive(Debug, Clone)]
pub struct DeferredTool {
    name: String,
    description: String,
    schema: Value,
}

impl From<ToolDescriptor> for DeferredTool {
    fn from(descriptor: ToolDescriptor) -> Self {
        Self {
            name: descriptor.name,
            description: descriptor.description,
            schema: Value::Object(descriptor.schema),
        }
    }
}

#[async_trait]
impl Tool for DeferredTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn call(&self, args: Map<String, Value>) -> ToolOutcome {
        ToolOutcome::Deferred(ToolCallIntent::new(&self.name, args))
    }
}

/// Adapt request tool descriptors, keeping their order
pub fn adapt_tools(descriptors: Vec<ToolDescriptor>) -> Vec<Arc<dyn Tool>> {
    descriptors
        .into_iter()
        .map(|descriptor| Arc::new(DeferredTool::from(descriptor)) as Arc<dyn Tool>)
        .collect()
}
