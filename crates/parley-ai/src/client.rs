//! Completion client abstraction
//!
//! The chat core talks to the provider through this seam: a request carries
//! an ordered message sequence plus an optional capability advertisement, and
//! the reply is already projected into a fixed internal shape so no caller
//! ever pattern-matches on loosely typed provider output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Message;

/// A request-time declaration that an optional hosted tool should be made
/// available to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolSpec {
    /// The hosted web search tool
    pub fn web_search() -> Self {
        Self {
            kind: "web_search".to_string(),
        }
    }
}

/// An outbound completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub input: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

impl CompletionRequest {
    /// Create a plain request with no capability advertisement
    pub fn new(model: impl Into<String>, input: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            input,
            tools: vec![],
            tool_choice: None,
        }
    }

    /// Advertise a tool with automatic tool choice
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Whether any capability is advertised
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// A provider reply projected into a fixed shape
#[derive(Debug, Clone)]
pub struct CompletionReply {
    /// The flattened reply text
    pub text: String,
    /// The full structured response, kept only for citation extraction
    pub raw: serde_json::Value,
}

impl CompletionReply {
    /// Create a reply from text alone (no structured payload)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: serde_json::Value::Null,
        }
    }
}

/// Completion invocation: ordered messages in, reply text or failure out
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply>;
}
