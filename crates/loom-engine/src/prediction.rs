//! Module inputs and results

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::tool::ToolCallIntent;

/// Named input values for one module call
pub type Inputs = IndexMap<String, Value>;

/// Capabilities a module result may expose
///
/// Consumers probe these in turn to read a result without knowing its
/// concrete type. Every method defaults to "not supported".
pub trait PredictionLike: fmt::Debug + Send + Sync {
    /// Ordered `(field, value)` pairs when the result is mapping-shaped
    fn items(&self) -> Option<Vec<(String, Value)>> {
        None
    }

    /// Conversion into a JSON object
    fn to_dict(&self) -> Option<Map<String, Value>> {
        None
    }

    /// Direct lookup of a single named field
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Tool calls the module stopped on, awaiting external execution
    fn pending_tool_calls(&self) -> &[ToolCallIntent] {
        &[]
    }
}

/// Ordered output fields produced by a module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    fields: IndexMap<String, Value>,
    tool_calls: Vec<ToolCallIntent>,
}

impl Prediction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value as text, if it is a JSON string
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn push_tool_call(&mut self, intent: ToolCallIntent) {
        self.tool_calls.push(intent);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Prediction {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            tool_calls: Vec::new(),
        }
    }
}

impl PredictionLike for Prediction {
    fn items(&self) -> Option<Vec<(String, Value)>> {
        Some(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn pending_tool_calls(&self) -> &[ToolCallIntent] {
        &self.tool_calls
    }
}

/// Record-shaped results, such as a decoded JSON reply
impl PredictionLike for Map<String, Value> {
    fn to_dict(&self) -> Option<Map<String, Value>> {
        Some(self.clone())
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}
