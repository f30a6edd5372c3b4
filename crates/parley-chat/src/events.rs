//! Completed-turn handoff types
//!
//! A worker performing the blocking network calls hands exactly one of these
//! back to the coordinating context per turn, so display state and the store
//! are updated as an atomic unit.

use serde::{Deserialize, Serialize};

/// Result of one compaction pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionOutcome {
    /// How many messages were collapsed into the summary
    pub summarized_messages: usize,
    /// Estimated tokens before compaction
    pub tokens_before: u32,
    /// Estimated tokens after compaction
    pub tokens_after: u32,
}

/// Everything produced by one user turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The assistant's reply text
    pub reply: String,
    /// URLs extracted from the reply, first-seen order, deduplicated
    pub sources: Vec<String>,
    /// Whether the capability fallback retry was taken
    pub used_fallback: bool,
    /// Compaction result, if the budget check triggered one
    pub compaction: Option<CompactionOutcome>,
    /// Soft warning from an abandoned compaction attempt
    pub compaction_warning: Option<String>,
}
