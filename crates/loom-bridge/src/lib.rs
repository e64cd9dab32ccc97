//! Inference bridge between structured reasoning requests and the engine
//!
//! A request names a module kind, a signature and its inputs. The bridge
//! builds the module, runs it against the language-model gateway with the
//! caller's credential, and answers with one JSON document or a normalized
//! server-sent event stream of `chunk`, `status`, `tool_call` and
//! `prediction` frames ending in `[DONE]`.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod dispatch;
pub mod error;
pub mod extract;
pub mod handler;
pub mod history;
pub mod invoke;
pub mod signature;
pub mod state;
pub mod stream;
pub mod tools;
pub mod types;

pub use dispatch::{Dispatched, Dispatcher, ModuleKind};
pub use error::BridgeError;
pub use handler::{UpstreamToken, bridge_router};
pub use state::BridgeState;
pub use types::{InvocationRequest, InvocationResponse, StreamEvent, ToolDescriptor};
