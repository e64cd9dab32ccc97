//! Typed input/output signatures (`"context, question -> answer: str"`)

use std::collections::HashSet;
use std::fmt;

use crate::error::EngineError;

/// Output name used when a signature declares none
pub const DEFAULT_OUTPUT: &str = "answer";

/// One named field of a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    /// Declared type (`str`, `int`, `list[str]`, ...), if any
    pub type_hint: Option<String>,
}

impl FieldSpec {
    /// A plain text field
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
        }
    }

    pub fn typed(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: Some(type_hint.into()),
        }
    }

    /// Whether values of this field are free text rather than JSON
    pub fn is_text(&self) -> bool {
        matches!(self.type_hint.as_deref(), None | Some("str" | "string"))
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({})", self.name, self.type_hint.as_deref().unwrap_or("str"))
    }
}

/// Ordered input and output fields plus the task instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<FieldSpec>,
    pub outputs: Vec<FieldSpec>,
    pub instructions: String,
}

impl Signature {
    /// Build a signature from explicit fields with default instructions
    pub fn new(inputs: Vec<FieldSpec>, outputs: Vec<FieldSpec>) -> Self {
        let instructions = default_instructions(&inputs, &outputs);
        Self {
            inputs,
            outputs,
            instructions,
        }
    }

    /// Parse `"in1, in2: type -> out1, out2: type"`
    ///
    /// Without an arrow every field is an input and the single output is
    /// `answer`; an empty output side also falls back to `answer`.
    pub fn parse(spec: &str) -> Result<Self, EngineError> {
        let (lhs, rhs) = match spec.split_once("->") {
            Some((lhs, rhs)) => (lhs, Some(rhs)),
            None => (spec, None),
        };

        if rhs.is_some_and(|rhs| rhs.contains("->")) {
            return Err(EngineError::InvalidSignature(format!("`{spec}` has more than one `->`")));
        }

        let inputs = parse_side(lhs)?;
        let mut outputs = rhs.map(parse_side).transpose()?.unwrap_or_default();
        if outputs.is_empty() {
            outputs.push(FieldSpec::text(DEFAULT_OUTPUT));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = inputs.iter().chain(&outputs).find(|f| !seen.insert(f.name.as_str())) {
            return Err(EngineError::InvalidSignature(format!(
                "field `{}` is declared more than once",
                duplicate.name
            )));
        }

        Ok(Self::new(inputs, outputs))
    }

    /// Replace the instructions
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Copy of this signature with `field` as the first output
    ///
    /// Returns an unchanged copy if an output with that name exists.
    #[must_use]
    pub fn prepend_output(&self, field: FieldSpec) -> Self {
        let mut signature = self.clone();
        if !signature.has_output(&field.name) {
            signature.outputs.insert(0, field);
        }
        signature
    }

    /// Copy of this signature with `field` as the last input
    #[must_use]
    pub fn append_input(&self, field: FieldSpec) -> Self {
        let mut signature = self.clone();
        if !signature.inputs.iter().any(|f| f.name == field.name) {
            signature.inputs.push(field);
        }
        signature
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|f| f.name == name)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|f| f.name.as_str())
    }
}

/// Split one side of a signature on its top-level commas
///
/// Commas nested in `[]`, `()` or `{}` belong to a type annotation.
pub fn split_fields(side: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in side.char_indices() {
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&side[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&side[start..]);
    pieces
}

fn parse_side(side: &str) -> Result<Vec<FieldSpec>, EngineError> {
    split_fields(side)
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (name, type_hint) = match piece.split_once(':') {
                Some((name, hint)) => (name.trim(), Some(hint.trim()).filter(|h| !h.is_empty())),
                None => (piece, None),
            };

            if !is_identifier(name) {
                return Err(EngineError::InvalidSignature(format!("`{name}` is not a valid field name")));
            }

            Ok(FieldSpec {
                name: name.to_owned(),
                type_hint: type_hint.map(str::to_owned),
            })
        })
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn quoted(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(|f| format!("`{}`", f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn default_instructions(inputs: &[FieldSpec], outputs: &[FieldSpec]) -> String {
    if inputs.is_empty() {
        format!("Produce the fields {}.", quoted(outputs))
    } else {
        format!("Given the fields {}, produce the fields {}.", quoted(inputs), quoted(outputs))
    }
}
