//! parley-ai: LLM provider layer
//!
//! This crate provides the message model shared by the chat core, a
//! token-estimation adapter, and the completion client abstraction with an
//! OpenAI Responses API implementation.

pub mod client;
pub mod error;
pub mod providers;
pub mod tokens;
pub mod types;

pub use client::{CompletionClient, CompletionReply, CompletionRequest, ToolSpec};
pub use error::{Error, Result};
pub use tokens::{Encoding, TokenEstimator};
pub use types::{Body, Message, Part, Role};
