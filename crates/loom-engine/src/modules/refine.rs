use async_trait::async_trait;
use serde_json::Value;

use super::{ChainOfThought, Module};
use crate::error::EngineError;
use crate::event::{EventSink, ModuleEvent};
use crate::lm::LanguageModel;
use crate::prediction::{Inputs, Prediction};
use crate::signature::{FieldSpec, Signature};

const DRAFT_FIELD: &str = "draft";

/// Self-correcting module: draft, critique, revise
///
/// The draft pass runs silently; only the revision streams.
#[derive(Debug, Clone)]
pub struct Refine {
    signature: Signature,
    draft: ChainOfThought,
    revise: ChainOfThought,
}

impl Refine {
    pub fn new(signature: Signature) -> Self {
        let instructions = format!(
            "{}\n\nA draft of the outputs is provided. Point out its mistakes in the reasoning, then give corrected \
             final fields.",
            signature.instructions
        );
        let revise = signature
            .append_input(FieldSpec::text(DRAFT_FIELD))
            .with_instructions(instructions);

        Self {
            draft: ChainOfThought::new(signature.clone()),
            revise: ChainOfThought::new(revise),
            signature,
        }
    }
}

fn render_draft(draft: &Prediction) -> String {
    draft
        .fields()
        .iter()
        .map(|(name, value)| match value {
            Value::String(text) => format!("{name}: {text}"),
            other => format!("{name}: {other}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Module for Refine {
    fn name(&self) -> &'static str {
        "refine"
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
        let draft = self.draft.forward(inputs, lm, None).await?;

        if let Some(sink) = sink {
            sink.status("Reviewing draft...").await?;
            sink.send(ModuleEvent::Custom {
                kind: "reflection".to_owned(),
                payload: Value::Object(draft.fields().iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            })
            .await?;
        }

        let mut revise_inputs = inputs.clone();
        revise_inputs.insert(DRAFT_FIELD.to_owned(), Value::String(render_draft(&draft)));
        self.revise.forward(&revise_inputs, lm, sink).await
    }
}
