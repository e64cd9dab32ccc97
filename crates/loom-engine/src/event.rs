//! Progress events emitted by a running module

use std::fmt;
use std::sync::Arc;

use loom_gateway::ChatStreamChunk;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::listener::StreamListener;
use crate::prediction::PredictionLike;
use crate::tool::ToolCallIntent;

/// Human-readable progress note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Incremental text attributed to one output field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChunk {
    pub signature_field_name: String,
    pub chunk: String,
}

/// Something that happened while a module ran
///
/// Consumers must tolerate variants they do not recognize.
#[derive(Debug)]
#[non_exhaustive]
pub enum ModuleEvent {
    Status(StatusMessage),
    /// Raw model output not attributed to a field
    ModelDelta(ChatStreamChunk),
    FieldChunk(FieldChunk),
    /// A tool call the module wants executed elsewhere
    ToolCall(ToolCallIntent),
    /// The final result; always the last event of a successful run
    Prediction(Box<dyn PredictionLike>),
    /// Module-specific event with an opaque payload
    Custom { kind: String, payload: Value },
}

impl fmt::Display for ModuleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => f.write_str(&status.message),
            Self::ModelDelta(chunk) => {
                let delta = chunk.delta();
                let text = delta
                    .and_then(|d| d.content.as_deref().or(d.reasoning_content.as_deref()))
                    .unwrap_or_default();
                f.write_str(text)
            }
            Self::FieldChunk(chunk) => write!(f, "{}: {}", chunk.signature_field_name, chunk.chunk),
            Self::ToolCall(intent) => write!(f, "tool call {} ({})", intent.name, intent.id),
            Self::Prediction(prediction) => write!(f, "{prediction:?}"),
            Self::Custom { kind, payload } => write!(f, "{kind}: {payload}"),
        }
    }
}

pub type EventResult = Result<ModuleEvent, EngineError>;

/// Handle a module uses to publish events during a streaming run
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EventResult>,
    listeners: Arc<[StreamListener]>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<EventResult>, listeners: impl Into<Arc<[StreamListener]>>) -> Self {
        Self {
            tx,
            listeners: listeners.into(),
        }
    }

    /// Fields whose text should be emitted as [`FieldChunk`]s
    pub fn listeners(&self) -> &[StreamListener] {
        &self.listeners
    }

    /// Publish an event
    ///
    /// Fails with [`EngineError::Cancelled`] once the consumer has gone away,
    /// which modules propagate to stop early.
    pub async fn send(&self, event: ModuleEvent) -> Result<(), EngineError> {
        self.tx.send(Ok(event)).await.map_err(|_| EngineError::Cancelled)
    }

    pub async fn status(&self, message: impl Into<String>) -> Result<(), EngineError> {
        self.send(ModuleEvent::Status(StatusMessage::new(message))).await
    }
}
