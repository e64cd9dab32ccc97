//! Client for the language-model gateway
//!
//! The gateway speaks the `OpenAI` chat completions protocol. Every LM call a
//! reasoning module makes goes through [`GatewayClient`], carrying the
//! credential of the invocation it belongs to.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{ChunkStream, GatewayClient};
pub use error::GatewayError;
pub use protocol::{ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk, StreamDelta};
