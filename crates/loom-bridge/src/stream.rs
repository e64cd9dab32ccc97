//! Streaming invocation: engine events to normalized frames

use std::sync::Arc;

use futures_util::future::ready;
use futures_util::{Stream, StreamExt, stream};
use indexmap::IndexSet;
use loom_engine::{EngineError, FieldChunk, Inputs, LanguageModel, Module, ModuleEvent, StreamListener, streamify};

use crate::extract::{external_field_name, extract_outputs};
use crate::signature::output_fields;
use crate::types::StreamEvent;

/// Payload of the terminating frame
pub const DONE: &str = "[DONE]";

const REASONING: &str = "reasoning";
const ANSWER: &str = "answer";

/// One frame of a streaming response
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(StreamEvent),
    /// `status` reporting the error that ended the run
    Failure(StreamEvent),
    /// End of stream; always the last frame and sent exactly once
    Done,
}

/// Listeners for `reasoning` plus every declared output, without repeats
pub fn listeners_for(signature: &str) -> Vec<StreamListener> {
    let fields: IndexSet<String> = std::iter::once(REASONING.to_owned())
        .chain(output_fields(signature))
        .collect();
    fields.into_iter().map(StreamListener::new).collect()
}

/// Map one engine event to zero or more wire events
///
/// Events of unknown shape become `status` frames carrying their text.
pub fn classify(event: ModuleEvent) -> Vec<StreamEvent> {
    match event {
        ModuleEvent::Status(status) => vec![StreamEvent::status(status.message)],
        ModuleEvent::ModelDelta(chunk) => {
            let Some(delta) = chunk.delta() else {
                return Vec::new();
            };
            let reasoning = delta
                .reasoning_content
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| StreamEvent::chunk(REASONING, text));
            let content = delta
                .content
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| StreamEvent::chunk(ANSWER, text));
            reasoning.into_iter().chain(content).collect()
        }
        ModuleEvent::FieldChunk(FieldChunk {
            signature_field_name,
            chunk,
        }) => {
            if chunk.is_empty() {
                return Vec::new();
            }
            vec![StreamEvent::chunk(external_field_name(&signature_field_name), chunk)]
        }
        ModuleEvent::ToolCall(intent) => vec![StreamEvent::ToolCall(intent.into())],
        ModuleEvent::Prediction(prediction) => vec![StreamEvent::Prediction {
            outputs: extract_outputs(&*prediction),
        }],
        other => vec![StreamEvent::status(other.to_string())],
    }
}

/// Normalize an engine event stream into wire frames
///
/// `leading` events go first. The first error ends consumption and is
/// reported as a `status` frame. [`Frame::Done`] always closes the stream.
pub fn normalize<S>(events: S, leading: Vec<StreamEvent>) -> impl Stream<Item = Frame> + Send
where
    S: Stream<Item = Result<ModuleEvent, EngineError>> + Send,
{
    let body = events
        .scan(false, |failed, item| {
            if *failed {
                return ready(None);
            }
            ready(Some(match item {
                Ok(event) => classify(event).into_iter().map(Frame::Event).collect(),
                Err(e) => {
                    tracing::error!(error = %e, "stream execution failed");
                    *failed = true;
                    vec![Frame::Failure(StreamEvent::status(format!("error: {e}")))]
                }
            }))
        })
        .flat_map(stream::iter);

    stream::iter(leading)
        .map(Frame::Event)
        .chain(body)
        .chain(stream::once(ready(Frame::Done)))
}

/// Run `module` and stream its normalized frames
///
/// Dropping the returned stream cancels the run.
pub fn invoke_stream(
    module: Arc<dyn Module>,
    inputs: Inputs,
    lm: LanguageModel,
    signature: &str,
    diagnostics: Vec<String>,
) -> impl Stream<Item = Frame> + Send + use<> {
    let events = streamify(module, inputs, lm, listeners_for(signature));
    normalize(events, diagnostics.into_iter().map(StreamEvent::status).collect())
}
