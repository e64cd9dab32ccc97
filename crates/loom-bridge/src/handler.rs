//! `POST /invoke`

use std::convert::Infallible;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router, routing};
use futures_util::{Stream, StreamExt};
use loom_telemetry::metrics;
use secrecy::SecretString;

use crate::dispatch::ModuleKind;
use crate::error::BridgeError;
use crate::invoke::{invoke_sync, prepare_inputs};
use crate::state::BridgeState;
use crate::stream::{DONE, Frame, invoke_stream};
use crate::types::InvocationRequest;

/// Bearer credential forwarded by the upstream caller
///
/// Inserted into request extensions by the server middleware.
#[derive(Debug, Clone)]
pub struct UpstreamToken(pub SecretString);

/// Router serving the invocation endpoint
pub fn bridge_router(state: BridgeState) -> Router {
    Router::new()
        .route("/invoke", routing::post(invoke))
        .with_state(state)
}

async fn invoke(
    State(state): State<BridgeState>,
    upstream: Option<Extension<UpstreamToken>>,
    body: Bytes,
) -> Response {
    let start = Instant::now();

    let request: InvocationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed request");
            return BridgeError::MalformedRequest(format!("invalid JSON body: {e}")).into_response();
        }
    };

    let InvocationRequest {
        kind,
        signature,
        inputs,
        tools,
        model,
        stream,
        auth_token,
    } = request;

    let credential = auth_token
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
        .or_else(|| upstream.map(|Extension(UpstreamToken(token))| token));
    let lm = state.language_model(model.as_deref(), credential);

    tracing::info!(%kind, model = lm.model(), stream, %signature, "invoke");

    let dispatched = match state.dispatcher().dispatch(&kind, &signature, tools) {
        Ok(dispatched) => dispatched,
        Err(e) => {
            tracing::warn!(%kind, error = %e, "rejecting invocation");
            metrics::record_invocation(&kind_label(&kind), mode(stream), "invalid", start);
            return e.into_response();
        }
    };

    let kind = dispatched.kind.to_string();
    let inputs = prepare_inputs(inputs);

    if stream {
        let frames = invoke_stream(dispatched.module, inputs, lm, &signature, dispatched.diagnostics);
        return stream_response(frames, kind, start);
    }

    match invoke_sync(dispatched.module, inputs, lm).await {
        Ok(response) => {
            metrics::record_invocation(&kind, "sync", "ok", start);
            Json(response).into_response()
        }
        Err(e) => {
            metrics::record_invocation(&kind, "sync", "error", start);
            e.into_response()
        }
    }
}

const fn mode(stream: bool) -> &'static str {
    if stream { "stream" } else { "sync" }
}

/// Metric label for a requested kind; unrecognized names share one label
fn kind_label(kind: &str) -> String {
    kind.parse::<ModuleKind>()
        .map_or_else(|_| "unknown".to_owned(), |kind| kind.to_string())
}

/// Records stream metrics when the response body is dropped
///
/// Runs whether the stream finished or the client went away.
struct StreamRecorder {
    kind: String,
    start: Instant,
    frames: u64,
    failed: bool,
    done: bool,
}

impl StreamRecorder {
    fn new(kind: String, start: Instant) -> Self {
        Self {
            kind,
            start,
            frames: 0,
            failed: false,
            done: false,
        }
    }

    fn observe(&mut self, frame: &Frame) {
        self.frames += 1;
        match frame {
            Frame::Event(_) => {}
            Frame::Failure(_) => self.failed = true,
            Frame::Done => self.done = true,
        }
    }

    const fn outcome(&self) -> &'static str {
        if self.failed {
            "error"
        } else if self.done {
            "ok"
        } else {
            "cancelled"
        }
    }
}

impl Drop for StreamRecorder {
    fn drop(&mut self) {
        let outcome = self.outcome();
        metrics::record_stream_frames(&self.kind, self.frames);
        metrics::record_invocation(&self.kind, "stream", outcome, self.start);
        tracing::debug!(
            kind = %self.kind,
            frames = self.frames,
            outcome,
            elapsed = ?self.start.elapsed(),
            "stream closed"
        );
    }
}

fn stream_response(frames: impl Stream<Item = Frame> + Send + 'static, kind: String, start: Instant) -> Response {
    let mut recorder = StreamRecorder::new(kind, start);

    let events = frames.map(move |frame| {
        recorder.observe(&frame);
        let data = match frame {
            Frame::Event(event) | Frame::Failure(event) => serde_json::to_string(&event).unwrap_or_default(),
            Frame::Done => DONE.to_owned(),
        };
        Ok::<_, Infallible>(Event::default().data(data))
    });

    let mut response = Sse::new(events).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
