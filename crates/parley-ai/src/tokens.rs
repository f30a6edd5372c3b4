//! Token estimation adapter
//!
//! The chat core only needs a cheap, model-aware upper-bound estimate to
//! drive the compaction budget; it never needs exact token counts. The
//! estimator maps model ids to an encoding family and applies that family's
//! chars-per-token ratio to the flattened text content. Image parts are not
//! subject to the budget and contribute nothing.

use crate::types::Message;

/// Encoding families with their approximate chars-per-token density
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Used by long-context model generations
    O200kBase,
    /// Default fallback encoding
    Cl100kBase,
}

/// Model-name fragments that indicate the long-context encoding family
const O200K_HINTS: &[&str] = &["gpt-5", "4.1", "4o", "o4", "o3", "200k"];

impl Encoding {
    /// Select an encoding for a model id. Unknown ids fall back to
    /// `Cl100kBase`; this never fails.
    pub fn for_model(model_id: &str) -> Self {
        if O200K_HINTS.iter().any(|hint| model_id.contains(hint)) {
            Self::O200kBase
        } else {
            Self::Cl100kBase
        }
    }

    fn chars_per_token(self) -> f32 {
        match self {
            // o200k packs slightly more characters per token
            Self::O200kBase => 4.4,
            Self::Cl100kBase => 4.0,
        }
    }
}

/// Estimates token costs for messages under a fixed encoding
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    encoding: Encoding,
}

impl TokenEstimator {
    /// Create an estimator with an explicit encoding
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Create an estimator for a model id, falling back to the default
    /// encoding for unrecognized names
    pub fn for_model(model_id: &str) -> Self {
        Self::new(Encoding::for_model(model_id))
    }

    /// Get the selected encoding
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Estimate token count for a piece of text
    pub fn estimate(&self, text: &str) -> u32 {
        (text.len() as f32 / self.encoding.chars_per_token()).ceil() as u32
    }

    /// Estimate token count for a single message (text content only)
    pub fn estimate_message(&self, message: &Message) -> u32 {
        self.estimate(&message.text())
    }

    /// Estimate total tokens for a slice of messages
    pub fn estimate_total(&self, messages: &[Message]) -> u32 {
        messages.iter().map(|m| self.estimate_message(m)).sum()
    }
}
