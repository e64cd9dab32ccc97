//! Module kind selection

use std::sync::Arc;

use loom_config::EngineConfig;
use loom_engine::{ChainOfThought, EngineCapabilities, Module, Predict, ReAct, Refine, Signature};
use strum::EnumString;

use crate::error::BridgeError;
use crate::tools::adapt_tools;
use crate::types::ToolDescriptor;

/// Reasoning module variants a request may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
pub enum ModuleKind {
    #[strum(to_string = "predict")]
    Predict,
    #[strum(to_string = "chain_of_thought", serialize = "cot")]
    ChainOfThought,
    #[strum(to_string = "tool_using", serialize = "react")]
    ToolUsing,
    #[strum(to_string = "reflective", serialize = "rlm")]
    Reflective,
}

impl ModuleKind {
    /// Kind used when a request names none
    pub fn default_name() -> String {
        Self::ChainOfThought.to_string()
    }
}

/// A module ready to run, with notes about how it was chosen
pub struct Dispatched {
    /// The kind actually built, after any fallback
    pub kind: ModuleKind,
    pub module: Arc<dyn Module>,
    /// Non-fatal notes for the caller, such as a capability fallback
    pub diagnostics: Vec<String>,
}

impl std::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatched")
            .field("kind", &self.kind)
            .field("module", &self.module.name())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// Builds modules according to the engine's capabilities
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    capabilities: EngineCapabilities,
    max_tool_iterations: usize,
}

impl Dispatcher {
    pub const fn new(capabilities: EngineCapabilities, max_tool_iterations: usize) -> Self {
        Self {
            capabilities,
            max_tool_iterations,
        }
    }

    /// Build the module for `kind` over `signature`
    ///
    /// Fails without building anything when the kind is unknown or the
    /// signature cannot be parsed. A `reflective` request on an engine
    /// without that capability yields a chain-of-thought module and a
    /// diagnostic.
    pub fn dispatch(&self, kind: &str, signature: &str, tools: Vec<ToolDescriptor>) -> Result<Dispatched, BridgeError> {
        let requested: ModuleKind = kind
            .parse()
            .map_err(|_| BridgeError::InvalidRequest(format!("unknown module kind: {kind:?}")))?;
        let signature = Signature::parse(signature).map_err(|e| BridgeError::InvalidRequest(e.to_string()))?;

        let mut diagnostics = Vec::new();
        let kind = if requested == ModuleKind::Reflective && !self.capabilities.reflective {
            tracing::warn!("reflective module not available, falling back to chain_of_thought");
            diagnostics.push("reflective module not available, falling back to chain_of_thought".to_owned());
            ModuleKind::ChainOfThought
        } else {
            requested
        };

        if kind != ModuleKind::ToolUsing && !tools.is_empty() {
            tracing::debug!(%kind, tools = tools.len(), "ignoring tools for a module that does not use them");
        }

        let module: Arc<dyn Module> = match kind {
            ModuleKind::Predict => Arc::new(Predict::new(signature)),
            ModuleKind::ChainOfThought => Arc::new(ChainOfThought::new(signature)),
            ModuleKind::ToolUsing => Arc::new(ReAct::new(signature, adapt_tools(tools), self.max_tool_iterations)),
            ModuleKind::Reflective => Arc::new(Refine::new(signature)),
        };

        Ok(Dispatched {
            kind,
            module,
            diagnostics,
        })
    }
}

impl From<&EngineConfig> for Dispatcher {
    fn from(config: &EngineConfig) -> Self {
        Self::new(
            EngineCapabilities {
                reflective: config.reflective,
            },
            config.max_tool_iterations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(reflective: bool) -> Dispatcher {
        Dispatcher::new(EngineCapabilities { reflective }, 3)
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("cot".parse::<ModuleKind>().unwrap(), ModuleKind::ChainOfThought);
        assert_eq!("react".parse::<ModuleKind>().unwrap(), ModuleKind::ToolUsing);
        assert_eq!("rlm".parse::<ModuleKind>().unwrap(), ModuleKind::Reflective);
        assert_eq!("tool_using".parse::<ModuleKind>().unwrap(), ModuleKind::ToolUsing);
        assert_eq!(ModuleKind::ChainOfThought.to_string(), "chain_of_thought");
    }

    #[test]
    fn builds_requested_variant() {
        let dispatched = dispatcher(true).dispatch("predict", "question -> answer", Vec::new()).unwrap();
        assert_eq!(dispatched.kind, ModuleKind::Predict);
        assert_eq!(dispatched.module.name(), "predict");
        assert!(dispatched.diagnostics.is_empty());

        let dispatched = dispatcher(true).dispatch("reflective", "question -> answer", Vec::new()).unwrap();
        assert_eq!(dispatched.module.name(), "refine");
    }

    #[test]
    fn reflective_falls_back_without_capability() {
        let dispatched = dispatcher(false).dispatch("rlm", "question -> answer", Vec::new()).unwrap();

        assert_eq!(dispatched.kind, ModuleKind::ChainOfThought);
        assert_eq!(dispatched.module.name(), "chain_of_thought");
        assert_eq!(dispatched.diagnostics.len(), 1);
    }

    #[test]
    fn unknown_kind_is_invalid_request() {
        let err = dispatcher(true).dispatch("bogus", "question -> answer", Vec::new()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRequest(_)));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn malformed_signature_is_invalid_request() {
        let err = dispatcher(true).dispatch("predict", "the question -> answer", Vec::new()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRequest(_)));
    }
}
