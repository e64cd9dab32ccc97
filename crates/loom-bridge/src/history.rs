//! Chat history normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input field carrying chat history
pub const HISTORY_INPUT: &str = "history";

const DEFAULT_ROLE: &str = "user";

/// One prior chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Canonical `{role, content}` turns from a history value
///
/// Accepts an array or a JSON-encoded array. Anything else yields no turns.
/// Entries without a non-empty string `content` are dropped; a missing role
/// becomes `user`.
pub fn normalize_history(raw: &Value) -> Vec<HistoryEntry> {
    let decoded;
    let value = match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                decoded = value;
                &decoded
            }
            Err(e) => {
                tracing::debug!(error = %e, "history is not valid JSON, ignoring it");
                return Vec::new();
            }
        },
        other => other,
    };

    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let record = entry.as_object()?;
            let content = record.get("content")?.as_str().filter(|c| !c.is_empty())?;
            let role = record.get("role").and_then(Value::as_str).unwrap_or(DEFAULT_ROLE);
            Some(HistoryEntry {
                role: role.to_owned(),
                content: content.to_owned(),
            })
        })
        .collect()
}
