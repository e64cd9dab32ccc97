use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ChainOfThought, Module, Predict};
use crate::error::EngineError;
use crate::event::{EventSink, ModuleEvent};
use crate::lm::LanguageModel;
use crate::prediction::{Inputs, Prediction};
use crate::signature::{FieldSpec, Signature};
use crate::tool::{Tool, ToolOutcome};

const TRAJECTORY_FIELD: &str = "trajectory";
const FINISH_TOOL: &str = "finish";

/// Tool-using agent loop
///
/// Each step asks the model for a thought, a tool name and its arguments,
/// runs the tool and appends the observation to the trajectory. The loop
/// ends on `finish`, after `max_iters` steps, or at the first tool that
/// defers to an external runner. A chain-of-thought pass over the
/// trajectory then produces the declared outputs.
#[derive(Debug)]
pub struct ReAct {
    signature: Signature,
    tools: Vec<Arc<dyn Tool>>,
    max_iters: usize,
    step: Predict,
    extract: ChainOfThought,
}

impl ReAct {
    pub fn new(signature: Signature, tools: Vec<Arc<dyn Tool>>, max_iters: usize) -> Self {
        let step = Predict::new(step_signature(&signature, &tools));
        let extract = ChainOfThought::new(signature.append_input(FieldSpec::text(TRAJECTORY_FIELD)));
        Self {
            signature,
            tools,
            max_iters,
            step,
            extract,
        }
    }

    fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }
}

fn step_signature(signature: &Signature, tools: &[Arc<dyn Tool>]) -> Signature {
    let inputs = signature
        .inputs
        .iter()
        .cloned()
        .chain([FieldSpec::text(TRAJECTORY_FIELD)])
        .collect();
    let outputs = vec![
        FieldSpec::text("next_thought"),
        FieldSpec::text("next_tool_name"),
        FieldSpec::typed("next_tool_args", "dict"),
    ];

    let mut instructions = format!(
        "{}\n\nYou are an agent working towards the fields {}. Each turn, given the inputs and the trajectory so \
         far, think about what to do next and pick one tool along with JSON arguments for it. Observations from \
         earlier tool calls appear in the trajectory.\n\nAvailable tools:\n",
        signature.instructions,
        signature
            .outputs
            .iter()
            .map(|f| format!("`{}`", f.name))
            .collect::<Vec<_>>()
            .join(", "),
    );
    for (i, tool) in tools.iter().enumerate() {
        let _ = writeln!(instructions, "({}) {}: {} Arguments: {}", i + 1, tool.name(), tool.description(), tool.schema());
    }
    let _ = write!(
        instructions,
        "({}) {FINISH_TOOL}: Signals that enough information has been gathered to produce the outputs. Arguments: {{}}",
        tools.len() + 1
    );

    Signature::new(inputs, outputs).with_instructions(instructions)
}

fn tool_args(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(args)) => args.clone(),
        Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_default(),
        _ => Map::new(),
    }
}

#[async_trait]
impl Module for ReAct {
    fn name(&self) -> &'static str {
        "react"
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
        let mut trajectory = String::new();

        for step in 1..=self.max_iters {
            let mut step_inputs = inputs.clone();
            step_inputs.insert(TRAJECTORY_FIELD.to_owned(), Value::String(trajectory.clone()));

            let decision = match self.step.forward(&step_inputs, lm, None).await {
                Ok(decision) => decision,
                Err(EngineError::Adapter(reason)) => {
                    tracing::warn!(step, %reason, "agent step could not be parsed, ending tool loop");
                    break;
                }
                Err(e) => return Err(e),
            };

            let thought = decision.text("next_thought").unwrap_or_default().to_owned();
            let tool_name = decision.text("next_tool_name").unwrap_or_default().trim().to_owned();
            let args = tool_args(decision.get("next_tool_args"));

            let _ = writeln!(trajectory, "Thought {step}: {thought}");
            let _ = writeln!(trajectory, "Action {step}: {tool_name}({})", Value::Object(args.clone()));

            if tool_name == FINISH_TOOL {
                break;
            }

            let Some(tool) = self.tool(&tool_name) else {
                tracing::debug!(step, tool = %tool_name, "model picked an unknown tool");
                let _ = writeln!(trajectory, "Observation {step}: error: unknown tool `{tool_name}`");
                continue;
            };

            if let Some(sink) = sink {
                sink.status(format!("Calling tool {tool_name}...")).await?;
            }

            match tool.call(args).await {
                ToolOutcome::Observation(observation) => {
                    let _ = writeln!(trajectory, "Observation {step}: {observation}");
                }
                ToolOutcome::Deferred(intent) => {
                    tracing::debug!(step, tool = %intent.name, id = %intent.id, "tool call deferred to caller");
                    if let Some(sink) = sink {
                        sink.send(ModuleEvent::ToolCall(intent.clone())).await?;
                    }

                    let mut prediction = Prediction::new();
                    prediction.insert("reasoning", thought);
                    prediction.push_tool_call(intent);
                    return Ok(prediction);
                }
            }
        }

        let mut extract_inputs = inputs.clone();
        extract_inputs.insert(TRAJECTORY_FIELD.to_owned(), Value::String(trajectory));
        self.extract.forward(&extract_inputs, lm, sink).await
    }
}
