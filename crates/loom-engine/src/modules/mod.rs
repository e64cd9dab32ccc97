//! Reasoning module variants

mod chain_of_thought;
mod predict;
mod react;
mod refine;

use async_trait::async_trait;

pub use chain_of_thought::ChainOfThought;
pub use predict::Predict;
pub use react::ReAct;
pub use refine::Refine;

use crate::error::EngineError;
use crate::event::EventSink;
use crate::lm::LanguageModel;
use crate::prediction::{Inputs, Prediction};
use crate::signature::Signature;

/// A strategy for producing a signature's outputs from its inputs
///
/// `sink` is present only for streaming runs. Modules publish progress
/// through it and must return promptly once a send fails.
#[async_trait]
pub trait Module: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn signature(&self) -> &Signature;

    async fn forward(
        &self,
        inputs: &Inputs,
        lm: &LanguageModel,
        sink: Option<&EventSink>,
    ) -> Result<Prediction, EngineError>;
}

/// Optional features of this engine build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCapabilities {
    /// Whether [`Refine`] is available
    pub reflective: bool,
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        Self { reflective: true }
    }
}
