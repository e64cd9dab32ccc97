//! Per-invocation language model handle

use futures_util::StreamExt;
use loom_gateway::{ChatMessage, ChatRequest, ChatStreamChunk, GatewayClient, StreamDelta};
use secrecy::SecretString;

use crate::error::EngineError;
use crate::event::{EventSink, FieldChunk, ModuleEvent};
use crate::listener::{FieldStreamer, Segment};

/// Model, credential and sampling settings for one invocation
///
/// Built fresh for each request and passed to every module call. Two
/// handles never share anything but the gateway connection pool.
#[derive(Debug, Clone)]
pub struct LanguageModel {
    gateway: GatewayClient,
    model: String,
    credential: SecretString,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl LanguageModel {
    pub fn new(gateway: GatewayClient, model: impl Into<String>, credential: SecretString) -> Self {
        Self {
            gateway,
            model: model.into(),
            credential,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: None,
        }
    }

    /// Run one completion and return the reply text
    ///
    /// With a sink the completion is streamed: text under a listened field
    /// header is published as [`FieldChunk`]s, reasoning deltas and text
    /// outside any header as raw [`ModuleEvent::ModelDelta`]s.
    pub async fn generate(&self, messages: Vec<ChatMessage>, sink: Option<&EventSink>) -> Result<String, EngineError> {
        let request = self.request(messages);
        tracing::debug!(model = %self.model, messages = request.messages.len(), streaming = sink.is_some(), "calling language model");

        let Some(sink) = sink else {
            let response = self.gateway.complete(&request, &self.credential).await?;
            return Ok(response.text().unwrap_or_default().to_owned());
        };

        let mut chunks = self.gateway.complete_stream(&request, &self.credential).await?;
        let mut streamer = FieldStreamer::new(sink.listeners());
        let mut text = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let Some(delta) = chunk.delta() else { continue };

            if let Some(reasoning) = delta.reasoning_content.as_deref().filter(|r| !r.is_empty()) {
                let delta = StreamDelta {
                    reasoning_content: Some(reasoning.to_owned()),
                    ..StreamDelta::default()
                };
                sink.send(ModuleEvent::ModelDelta(ChatStreamChunk::from_delta(&chunk.model, delta)))
                    .await?;
            }

            if let Some(content) = delta.content.as_deref().filter(|c| !c.is_empty()) {
                text.push_str(content);
                for segment in streamer.push(content) {
                    publish(sink, &chunk.model, segment).await?;
                }
            }
        }

        for segment in streamer.finish() {
            publish(sink, &self.model, segment).await?;
        }

        Ok(text)
    }
}

async fn publish(sink: &EventSink, model: &str, segment: Segment) -> Result<(), EngineError> {
    let event = match segment {
        Segment::Field { name, text } => ModuleEvent::FieldChunk(FieldChunk {
            signature_field_name: name,
            chunk: text,
        }),
        Segment::Raw(text) => {
            let delta = StreamDelta {
                content: Some(text),
                ..StreamDelta::default()
            };
            ModuleEvent::ModelDelta(ChatStreamChunk::from_delta(model, delta))
        }
    };
    sink.send(event).await
}
