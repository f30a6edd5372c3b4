//! Request building and capability fallback
//!
//! Translates a store snapshot plus a capability flag into an outbound
//! request, and recovers from a tool/model mismatch with exactly one retry
//! without the capability. Any other failure class surfaces unmodified.

use parley_ai::{CompletionClient, CompletionReply, CompletionRequest, Message, ToolSpec};

use crate::error::Result;

/// Builds outbound completion requests for one session
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
    web_search: bool,
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>, web_search: bool) -> Self {
        Self {
            model: model.into(),
            web_search,
        }
    }

    /// The selected model id
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the web search capability is advertised
    pub fn web_search_enabled(&self) -> bool {
        self.web_search
    }

    /// Assemble the request payload; advertises the hosted search tool with
    /// automatic tool choice when enabled.
    pub fn build(&self, messages: Vec<Message>) -> CompletionRequest {
        let request = CompletionRequest::new(&self.model, messages);
        if self.web_search {
            request.with_tool(ToolSpec::web_search())
        } else {
            request
        }
    }

    /// Invoke the completion call with the capability advertisement, retrying
    /// exactly once without it when the failure is classified as a tool/model
    /// mismatch. Returns the reply and whether the fallback was taken.
    pub async fn send_with_fallback(
        &self,
        client: &dyn CompletionClient,
        messages: Vec<Message>,
    ) -> Result<(CompletionReply, bool)> {
        let request = self.build(messages.clone());
        let advertised = request.has_tools();

        match client.complete(&request).await {
            Ok(reply) => Ok((reply, false)),
            Err(e) if advertised && e.is_capability_unsupported() => {
                tracing::warn!(
                    model = %self.model,
                    "tool/model mismatch, retrying without capability: {}",
                    e
                );
                let bare = CompletionRequest::new(&self.model, messages);
                let reply = client.complete(&bare).await?;
                Ok((reply, true))
            }
            Err(e) => Err(e.into()),
        }
    }
}
