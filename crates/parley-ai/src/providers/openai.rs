//! OpenAI Responses API client

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::{CompletionClient, CompletionReply, CompletionRequest};
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model-id fragments that mark non-chat endpoints
const NON_CHAT_FRAGMENTS: &[&str] = &[
    "embedding",
    "audio",
    "search",
    "realtime",
    "preview",
    "transcribe",
    "tts",
];

/// OpenAI API client
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (for proxies and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// List chat-capable model ids, sorted. Filters out endpoints not
    /// intended for standard completions by naming convention.
    pub async fn list_chat_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_api_error(status.as_u16(), &body));
        }

        let list: ModelList = response.json().await?;
        let mut ids: Vec<String> = list
            .data
            .into_iter()
            .map(|m| m.id)
            .filter(|id| is_chat_model(id))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply> {
        let url = format!("{}/responses", self.base_url);

        tracing::debug!(model = %request.model, tools = request.has_tools(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_api_error(status.as_u16(), &body));
        }

        let raw: serde_json::Value = response.json().await?;
        let text = extract_output_text(&raw)?;
        Ok(CompletionReply { text, raw })
    }
}

/// Identify models usable for standard chat completions by id
fn is_chat_model(id: &str) -> bool {
    if NON_CHAT_FRAGMENTS.iter().any(|f| id.contains(f)) {
        return false;
    }
    id.starts_with("gpt-") && !id.contains("instruct") && id != "gpt-image-1"
}

/// Map a non-success HTTP response into the error taxonomy
fn map_api_error(status: u16, body: &str) -> Error {
    if status == 401 {
        return Error::Auth(format!("401 Unauthorized: {}", body));
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => Error::Api {
            error_type: parsed
                .error
                .error_type
                .unwrap_or_else(|| format!("http_{}", status)),
            message: parsed.error.message,
        },
        Err(_) => Error::api(format!("http_{}", status), body.to_string()),
    }
}

/// Pull the reply text out of a Responses API payload: concatenate every
/// `output_text` content block across the output items.
fn extract_output_text(raw: &serde_json::Value) -> Result<String> {
    let output = raw
        .get("output")
        .and_then(|o| o.as_array())
        .ok_or_else(|| Error::UnexpectedResponse("missing output array".to_string()))?;

    let mut text = String::new();
    for item in output {
        let Some(content) = item.get("content").and_then(|c| c.as_array()) else {
            continue;
        };
        for block in content {
            if block.get("type").and_then(|t| t.as_str()) == Some("output_text") {
                if let Some(t) = block.get("text").and_then(|t| t.as_str()) {
                    text.push_str(t);
                }
            }
        }
    }
    Ok(text)
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- chat model filter ---

    #[test]
    fn test_chat_model_accepts_gpt() {
        assert!(is_chat_model("gpt-4o"));
        assert!(is_chat_model("gpt-4.1-mini"));
        assert!(is_chat_model("gpt-5"));
    }

    #[test]
    fn test_chat_model_rejects_by_fragment() {
        assert!(!is_chat_model("text-embedding-3-small"));
        assert!(!is_chat_model("gpt-4o-audio"));
        assert!(!is_chat_model("gpt-4o-search"));
        assert!(!is_chat_model("gpt-4o-realtime"));
        assert!(!is_chat_model("gpt-4.5-preview"));
        assert!(!is_chat_model("gpt-4o-transcribe"));
        assert!(!is_chat_model("gpt-4o-mini-tts"));
    }

    #[test]
    fn test_chat_model_rejects_instruct_and_image() {
        assert!(!is_chat_model("gpt-3.5-turbo-instruct"));
        assert!(!is_chat_model("gpt-image-1"));
        assert!(!is_chat_model("whisper-1"));
    }

    // --- error mapping ---

    #[test]
    fn test_map_401_to_auth() {
        let e = map_api_error(401, "no key");
        assert!(e.is_auth());
    }

    #[test]
    fn test_map_structured_error_body() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"web_search is not supported"}}"#;
        let e = map_api_error(400, body);
        match &e {
            Error::Api {
                error_type,
                message,
            } => {
                assert_eq!(error_type, "invalid_request_error");
                assert_eq!(message, "web_search is not supported");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(e.is_capability_unsupported());
    }

    #[test]
    fn test_map_unparseable_error_body() {
        let e = map_api_error(500, "Internal Server Error");
        match e {
            Error::Api { error_type, .. } => assert_eq!(error_type, "http_500"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // --- output text extraction ---

    #[test]
    fn test_extract_output_text() {
        let raw = serde_json::json!({
            "output": [
                { "type": "web_search_call", "status": "completed" },
                {
                    "type": "message",
                    "content": [
                        { "type": "output_text", "text": "Hello" },
                        { "type": "output_text", "text": " world" }
                    ]
                }
            ]
        });
        assert_eq!(extract_output_text(&raw).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_output_text_missing_output() {
        let raw = serde_json::json!({ "id": "resp_123" });
        assert!(matches!(
            extract_output_text(&raw),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_extract_output_text_empty_output() {
        let raw = serde_json::json!({ "output": [] });
        assert_eq!(extract_output_text(&raw).unwrap(), "");
    }
}
