use loom_engine::signature::{DEFAULT_OUTPUT, split_fields};

/// Output field names declared by a signature string, in order
///
/// Type annotations are dropped. Never fails: a signature without `->` or
/// with nothing after it yields `["answer"]`.
pub fn output_fields(signature: &str) -> Vec<String> {
    let Some((_, outputs)) = signature.split_once("->") else {
        return vec![DEFAULT_OUTPUT.to_owned()];
    };

    let fields: Vec<String> = split_fields(outputs)
        .into_iter()
        .map(|piece| piece.split_once(':').map_or(piece, |(name, _)| name).trim())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();

    if fields.is_empty() {
        vec![DEFAULT_OUTPUT.to_owned()]
    } else {
        fields
    }
}
