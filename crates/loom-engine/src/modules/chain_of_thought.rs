use async_trait::async_trait;

use super::{Module, Predict};
use crate::error::EngineError;
use crate::event::EventSink;
use crate::lm::LanguageModel;
use crate::prediction::{Inputs, Prediction};
use crate::signature::{FieldSpec, Signature};

/// Output field holding the step-by-step reasoning
pub const REASONING_FIELD: &str = "reasoning";

/// Predict with an extra leading `reasoning` output
#[derive(Debug, Clone)]
pub struct ChainOfThought {
    signature: Signature,
    predict: Predict,
}

impl ChainOfThought {
    pub fn new(signature: Signature) -> Self {
        let extended = signature.prepend_output(FieldSpec::text(REASONING_FIELD));
        Self {
            signature,
            predict: Predict::new(extended),
        }
    }
}

#[async_trait]
impl Module for ChainOfThought {
    fn name(&self) -> &'static str {
        "chain_of_thought"
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
        self.predict.forward(inputs, lm, sink).await
    }
}
