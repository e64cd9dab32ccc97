//! Non-streaming invocation

use std::sync::Arc;

use loom_engine::streamify::panic_message;
use loom_engine::{Inputs, LanguageModel, Module, PredictionLike};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::error::BridgeError;
use crate::extract::extract_outputs;
use crate::history::{HISTORY_INPUT, normalize_history};
use crate::types::{InvocationResponse, ToolCall};

/// Request inputs as the engine expects them
///
/// A `history` input is normalized into `{role, content}` turns.
pub fn prepare_inputs(mut inputs: Inputs) -> Inputs {
    if let Some(raw) = inputs.get_mut(HISTORY_INPUT) {
        let history = normalize_history(raw);
        *raw = serde_json::to_value(history).unwrap_or(Value::Array(Vec::new()));
    }
    inputs
}

/// Aborts the task when the awaiting request goes away
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `module` to completion on a worker task and flatten its outputs
///
/// Module failures, panics included, come back as
/// [`BridgeError::Execution`].
pub async fn invoke_sync(
    module: Arc<dyn Module>,
    inputs: Inputs,
    lm: LanguageModel,
) -> Result<InvocationResponse, BridgeError> {
    let name = module.name();
    let mut task = AbortOnDrop(tokio::spawn(async move { module.forward(&inputs, &lm, None).await }));

    let prediction = match (&mut task.0).await {
        Ok(Ok(prediction)) => prediction,
        Ok(Err(e)) => {
            tracing::error!(module = name, error = %e, "invocation failed");
            return Err(BridgeError::Execution(e.to_string()));
        }
        Err(e) => {
            let message = if e.is_panic() {
                panic_message(e.into_panic().as_ref())
            } else {
                e.to_string()
            };
            tracing::error!(module = name, %message, "invocation task failed");
            return Err(BridgeError::Execution(format!("module panicked: {message}")));
        }
    };

    Ok(InvocationResponse {
        outputs: extract_outputs(&prediction),
        tool_calls: prediction.pending_tool_calls().iter().cloned().map(ToolCall::from).collect(),
    })
}
