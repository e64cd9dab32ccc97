//! Reasoning-module host engine
//!
//! Modules turn a [`Signature`] and a set of inputs into a [`Prediction`] by
//! prompting a language model through the gateway. Every call receives its
//! [`LanguageModel`] handle explicitly; nothing about the model or its
//! credential is held process-wide.
//!
//! [`streamify`] runs a module on its own task and exposes its progress as a
//! stream of [`ModuleEvent`]s.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod adapter;
pub mod error;
pub mod event;
pub mod listener;
pub mod lm;
pub mod modules;
pub mod prediction;
pub mod signature;
pub mod streamify;
#[cfg(test)]
mod testing;
pub mod tool;

pub use error::EngineError;
pub use event::{EventSink, FieldChunk, ModuleEvent, StatusMessage};
pub use listener::StreamListener;
pub use lm::LanguageModel;
pub use modules::{ChainOfThought, EngineCapabilities, Module, Predict, ReAct, Refine};
pub use prediction::{Inputs, Prediction, PredictionLike};
pub use signature::{FieldSpec, Signature};
pub use streamify::{ModuleStream, streamify};
pub use tool::{Tool, ToolCallIntent, ToolOutcome};

/// Engine version reported by health checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
