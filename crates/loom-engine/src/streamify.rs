//! Run a module as a stream of events

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{FutureExt, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::event::{EventResult, EventSink, ModuleEvent};
use crate::listener::StreamListener;
use crate::lm::LanguageModel;
use crate::modules::Module;
use crate::prediction::Inputs;

const CHANNEL_CAPACITY: usize = 16;

/// Events of one module run, ending with the prediction or an error
///
/// Dropping the stream aborts the run.
#[derive(Debug)]
pub struct ModuleStream {
    rx: mpsc::Receiver<EventResult>,
    task: JoinHandle<()>,
}

impl Stream for ModuleStream {
    type Item = EventResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ModuleStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start `module` on its own task and stream its events
///
/// Text of the fields named by `listeners` arrives as
/// [`ModuleEvent::FieldChunk`]s. A module failure, including a panic, is the
/// last item of the stream.
pub fn streamify(
    module: Arc<dyn Module>,
    inputs: Inputs,
    lm: LanguageModel,
    listeners: Vec<StreamListener>,
) -> ModuleStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sink = EventSink::new(tx.clone(), listeners);

    let task = tokio::spawn(async move {
        let outcome = AssertUnwindSafe(module.forward(&inputs, &lm, Some(&sink)))
            .catch_unwind()
            .await;
        drop(sink);

        let last = match outcome {
            Ok(Ok(prediction)) => Ok(ModuleEvent::Prediction(Box::new(prediction))),
            Ok(Err(EngineError::Cancelled)) => {
                tracing::debug!(module = module.name(), "stream consumer went away");
                return;
            }
            Ok(Err(e)) => Err(e),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(module = module.name(), %message, "module panicked");
                Err(EngineError::Panicked(message))
            }
        };

        if tx.send(last).await.is_err() {
            tracing::debug!(module = module.name(), "stream consumer went away before the result");
        }
    });

    ModuleStream { rx, task }
}

/// Text of a panic payload
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
