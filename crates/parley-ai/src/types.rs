//! Core message types shared across the chat stack

use serde::{Deserialize, Serialize};

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A typed part of a multi-part message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Text segment
    Text { text: String },
    /// Image attachment (base64 encoded)
    Image { data: String, mime_type: String },
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image part from base64 data
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Get text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Message body: plain text for ordinary turns, typed parts when attachments
/// are present. Serializes as `"content": string | [{type, ...}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Parts(Vec<Part>),
}

impl Body {
    /// Flatten to plain text. Image parts contribute nothing; token
    /// estimation and summarization both operate on this view.
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.as_text())
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Whether the body carries any image parts
    pub fn has_images(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Parts(parts) => parts.iter().any(|p| matches!(p, Part::Image { .. })),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A single turn contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Body,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Body::Text(text.into()),
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Body::Text(text.into()),
        }
    }

    /// Create a user message with multiple parts
    pub fn user_with_parts(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            content: Body::Parts(parts),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Body::Text(text.into()),
        }
    }

    /// Get combined text content (image parts excluded)
    pub fn text(&self) -> String {
        self.content.flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_serializes_as_plain_string() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_body_serializes_as_parts() {
        let msg = Message::user_with_parts(vec![
            Part::text("look at this"),
            Part::image("aGVsbG8=", "image/png"),
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image");
        assert_eq!(json["content"][1]["mime_type"], "image/png");
    }

    #[test]
    fn test_body_roundtrip() {
        let original = Message::user_with_parts(vec![
            Part::text("a"),
            Part::image("data", "image/jpeg"),
        ]);
        let json = serde_json::to_string(&original).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_string_content_deserializes_as_text_body() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, Body::Text("hi".to_string()));
    }

    #[test]
    fn test_flatten_excludes_images() {
        let msg = Message::user_with_parts(vec![
            Part::text("before "),
            Part::image("xxxx", "image/png"),
            Part::text("after"),
        ]);
        assert_eq!(msg.text(), "before after");
        assert!(msg.content.has_images());
    }
}
