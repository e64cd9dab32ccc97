use serde::Deserialize;

/// Host reasoning engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether the reflective (self-correcting) module is offered
    ///
    /// When disabled, `reflective` requests run as `chain_of_thought`.
    #[serde(default = "default_reflective")]
    pub reflective: bool,
    /// Upper bound on thought/tool steps for tool-using modules
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reflective: default_reflective(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_reflective() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_tool_iterations() -> usize {
    5
}
