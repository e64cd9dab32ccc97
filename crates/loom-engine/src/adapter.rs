//! Chat prompt rendering and reply parsing
//!
//! Fields travel between the engine and the model as sections introduced by
//! `[[ ## name ## ]]` headers; the reply ends with `[[ ## completed ## ]]`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use loom_gateway::ChatMessage;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::EngineError;
use crate::prediction::{Inputs, Prediction};
use crate::signature::{FieldSpec, Signature};

/// Marker field that closes a reply
pub const COMPLETED_FIELD: &str = "completed";

/// Input field rendered as prior chat turns instead of a section
pub const HISTORY_FIELD: &str = "history";

fn header(name: &str) -> String {
    format!("[[ ## {name} ## ]]")
}

fn header_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[ ## (\w+) ## \]\]").expect("must be valid regex"))
}

#[derive(Debug, Deserialize)]
struct HistoryTurn {
    #[serde(default)]
    role: Option<String>,
    content: String,
}

/// Render the messages for one call of `signature` on `inputs`
pub fn format_messages(signature: &Signature, inputs: &Inputs) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt(signature))];
    messages.extend(history_messages(signature, inputs));
    messages.push(ChatMessage::user(user_prompt(signature, inputs)));
    messages
}

fn is_history(signature: &Signature, field: &FieldSpec, inputs: &Inputs) -> bool {
    field.name == HISTORY_FIELD
        && signature.inputs.iter().any(|f| f.name == HISTORY_FIELD)
        && inputs.get(HISTORY_FIELD).is_some_and(Value::is_array)
}

fn system_prompt(signature: &Signature) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Your input fields are:");
    for (i, field) in signature.inputs.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {field}", i + 1);
    }
    let _ = writeln!(prompt, "Your output fields are:");
    for (i, field) in signature.outputs.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {field}", i + 1);
    }

    prompt.push_str("All interactions will be structured in the following way, with the appropriate values filled in.\n\n");
    for field in signature.inputs.iter().chain(&signature.outputs) {
        let _ = write!(prompt, "{}\n{{{}}}\n\n", header(&field.name), field.name);
    }
    let _ = writeln!(prompt, "{}", header(COMPLETED_FIELD));
    let _ = write!(prompt, "In adhering to this structure, your objective is: \n        {}", signature.instructions);

    prompt
}

fn history_messages(signature: &Signature, inputs: &Inputs) -> Vec<ChatMessage> {
    let Some(turns) = inputs.get(HISTORY_FIELD).filter(|_| signature.inputs.iter().any(|f| f.name == HISTORY_FIELD))
    else {
        return Vec::new();
    };

    let turns: Vec<HistoryTurn> = serde_json::from_value(turns.clone()).unwrap_or_default();
    turns
        .into_iter()
        .map(|turn| {
            let role = match turn.role.as_deref() {
                Some(role @ ("system" | "assistant")) => role,
                _ => "user",
            };
            ChatMessage::new(role, turn.content)
        })
        .collect()
}

fn user_prompt(signature: &Signature, inputs: &Inputs) -> String {
    let mut prompt = String::new();

    for field in &signature.inputs {
        if is_history(signature, field, inputs) {
            continue;
        }
        let value = inputs.get(&field.name).map(render_value).unwrap_or_default();
        let _ = write!(prompt, "{}\n{value}\n\n", header(&field.name));
    }

    let order = signature
        .outputs
        .iter()
        .map(|field| {
            if field.is_text() {
                format!("`{}`", header(&field.name))
            } else {
                format!("`{}` (must be formatted as valid JSON)", header(&field.name))
            }
        })
        .collect::<Vec<_>>()
        .join(", then ");

    let _ = write!(
        prompt,
        "Respond with the corresponding output fields, starting with the field {order}, and then ending with the marker for `{}`.",
        header(COMPLETED_FIELD)
    );

    prompt
}

/// Render an input value as prompt text
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a model reply into the output fields of `signature`
///
/// A reply without any header is treated as the value of the last output
/// field. A reply with headers must contain every output field.
pub fn parse_completion(signature: &Signature, text: &str) -> Result<Prediction, EngineError> {
    let sections = split_sections(text);

    if sections.is_empty() {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Adapter("model returned an empty reply".to_owned()));
        }

        let last = signature.outputs.len().saturating_sub(1);
        return Ok(signature
            .outputs
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let raw = if i == last { text } else { "" };
                (field.name.clone(), decode(field, raw))
            })
            .collect());
    }

    let missing: Vec<&str> = signature
        .output_names()
        .filter(|name| !sections.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::Adapter(format!("missing output fields: {}", missing.join(", "))));
    }

    Ok(signature
        .outputs
        .iter()
        .map(|field| (field.name.clone(), decode(field, sections[field.name.as_str()])))
        .collect())
}

/// Split a reply into header-delimited sections, first occurrence wins
fn split_sections(text: &str) -> HashMap<&str, &str> {
    let headers: Vec<_> = header_pattern().captures_iter(text).collect();
    let mut sections = HashMap::new();

    for (i, captures) in headers.iter().enumerate() {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if name.as_str() == COMPLETED_FIELD {
            break;
        }
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        sections
            .entry(name.as_str())
            .or_insert_with(|| text[whole.end()..end].trim());
    }

    sections
}

fn decode(field: &FieldSpec, raw: &str) -> Value {
    if field.is_text() {
        return Value::String(raw.to_owned());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
