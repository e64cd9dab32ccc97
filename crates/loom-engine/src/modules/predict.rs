use async_trait::async_trait;

use super::Module;
use crate::adapter;
use crate::error::EngineError;
use crate::event::EventSink;
use crate::lm::LanguageModel;
use crate::prediction::{Inputs, Prediction};
use crate::signature::Signature;

/// Single completion over a signature
#[derive(Debug, Clone)]
pub struct Predict {
    signature: Signature,
}

impl Predict {
    pub const fn new(signature: Signature) -> Self {
        Self { signature }
    }
}

#[async_trait]
impl Module for Predict {
    fn name(&self) -> &'static str {
        "predict"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn forward(
        &self,
        inputs: &Inputs,
        lm: &LanguageModel,
        sink: Option<&EventSink>,
    ) -> Result<Prediction, EngineError> {
        let messages = adapter::format_messages(&self.signature, inputs);
        let reply = lm.generate(messages, sink).await?;
        adapter::parse_completion(&self.signature, &reply)
    }
}
