//! Flattening module results into text outputs

use indexmap::IndexMap;
use loom_engine::PredictionLike;
use serde_json::Value;

/// Output field name to text
pub type Outputs = IndexMap<String, String>;

const REASONING: &str = "reasoning";
const RATIONALE: &str = "rationale";

/// Fields looked up one by one when a result exposes no mapping
const PROBED_FIELDS: [&str; 4] = ["answer", REASONING, RATIONALE, "response"];

type Strategy = fn(&dyn PredictionLike) -> Option<Outputs>;

/// Extraction strategies, tried in order; the first match wins
const STRATEGIES: [(&str, Strategy); 3] = [("items", from_items), ("to_dict", from_dict), ("probe", probe_fields)];

/// Text outputs of a module result, with `rationale` renamed to `reasoning`
pub fn extract_outputs(prediction: &dyn PredictionLike) -> Outputs {
    let mut outputs = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let outputs = strategy(prediction)?;
            tracing::trace!(strategy = *name, fields = outputs.len(), "extracted outputs");
            Some(outputs)
        })
        .unwrap_or_default();

    rename_rationale(&mut outputs);
    outputs
}

fn from_items(prediction: &dyn PredictionLike) -> Option<Outputs> {
    let items = prediction.items()?;
    Some(items.into_iter().map(|(k, v)| (k, to_text(&v))).collect())
}

fn from_dict(prediction: &dyn PredictionLike) -> Option<Outputs> {
    let dict = prediction.to_dict()?;
    Some(dict.into_iter().map(|(k, v)| (k, to_text(&v))).collect())
}

fn probe_fields(prediction: &dyn PredictionLike) -> Option<Outputs> {
    Some(
        PROBED_FIELDS
            .iter()
            .filter_map(|&name| {
                let value = prediction.field(name).filter(|v| !v.is_null())?;
                Some((name.to_owned(), to_text(&value)))
            })
            .collect(),
    )
}

/// Text form of an output value; `null` is empty
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ensure no `rationale` field is observable
///
/// Its value moves to `reasoning` unless that field already exists, in
/// which case the explicit `reasoning` wins and `rationale` is dropped.
pub fn rename_rationale(outputs: &mut Outputs) {
    let Some(rationale) = outputs.shift_remove(RATIONALE) else {
        return;
    };
    if !outputs.contains_key(REASONING) {
        outputs.insert(REASONING.to_owned(), rationale);
    }
}

/// Field name as seen by the caller
pub fn external_field_name(name: &str) -> &str {
    if name == RATIONALE { REASONING } else { name }
}
