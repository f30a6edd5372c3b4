//! Memory manager: token-budget compaction over the conversation store
//!
//! After every assistant reply the manager estimates the token cost of the
//! full history. When the estimate exceeds the budget, everything between
//! the system message and a protected recent tail is collapsed into one
//! synthetic assistant message carrying a model-produced summary. A failed
//! summarization leaves the store untouched and is reported as a soft
//! warning; chat continues uncompacted until the next attempt.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parley_ai::{CompletionClient, CompletionRequest, Message, Role, TokenEstimator};

use crate::citations;
use crate::conversation::ConversationStore;
use crate::error::{Error, Result};
use crate::events::{CompactionOutcome, TurnOutcome};
use crate::request::RequestBuilder;

/// Fixed label prepended to the synthetic summary message
pub const SUMMARY_PREFIX: &str = "Summary of earlier conversation: ";

/// System prompt for the summarization call. Summarization always runs
/// without tool advertisements so it can never recurse into tool use.
const SUMMARY_SYSTEM_PROMPT: &str =
    "Summarize the following chat history in ~500 words, neutral tone.";

/// Token budget configuration for one session
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Ceiling on the estimated token cost of the full message sequence
    pub max_tokens: u32,
    /// Number of most-recent messages never eligible for compaction
    pub protected_tail: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_tokens: 20_000,
            protected_tail: 10,
        }
    }
}

/// Owns the conversation store for one session and keeps it under budget
pub struct MemoryManager {
    store: ConversationStore,
    config: MemoryConfig,
    estimator: TokenEstimator,
    summary_model: String,
    turn_in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag even if the turn future is dropped mid-await
struct TurnGuard(Arc<AtomicBool>);

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MemoryManager {
    /// Create a manager owning `store`. `summary_model` is the non-tool
    /// model variant used for summarization calls.
    pub fn new(
        store: ConversationStore,
        config: MemoryConfig,
        estimator: TokenEstimator,
        summary_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            config,
            estimator,
            summary_model: summary_model.into(),
            turn_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// View the live store
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// The budget configuration
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Set or overwrite the system prompt
    pub fn replace_system(&mut self, text: impl Into<String>) {
        self.store.replace_system(text);
    }

    /// Reset for a new chat, re-seeding with a fresh system message
    pub fn reset(&mut self, system_text: impl Into<String>) {
        self.store.reset(system_text);
    }

    /// Replace the store wholesale (session load)
    pub fn replace_store(&mut self, store: ConversationStore) {
        self.store = store;
    }

    /// Current estimated token cost of the full history
    pub fn estimated_tokens(&self) -> u32 {
        self.estimator.estimate_total(self.store.messages())
    }

    /// Run one user turn: append the user message, invoke the completion
    /// call (with capability fallback), append the reply, extract sources,
    /// and compact if over budget. Returns a single atomic outcome.
    ///
    /// On a hard failure the user message remains appended so the user can
    /// retry by resubmitting; no reply is appended.
    pub async fn run_turn(
        &mut self,
        client: &dyn CompletionClient,
        builder: &RequestBuilder,
        user_message: Message,
    ) -> Result<TurnOutcome> {
        if self
            .turn_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::TurnInFlight);
        }
        let _guard = TurnGuard(Arc::clone(&self.turn_in_flight));

        self.store.append(user_message);

        let (reply, used_fallback) = builder
            .send_with_fallback(client, self.store.snapshot())
            .await?;

        let sources = citations::extract_sources(&reply.raw, &reply.text);
        self.store.append(Message::assistant(reply.text.clone()));

        let (compaction, compaction_warning) = match self.compact_if_needed(client).await {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                tracing::warn!("compaction abandoned for this turn: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Ok(TurnOutcome {
            reply: reply.text,
            sources,
            used_fallback,
            compaction,
            compaction_warning,
        })
    }

    /// Check the budget and compact when an old segment exists.
    ///
    /// Returns `Ok(None)` when under budget or when nothing is eligible: a
    /// store with no messages between the system slot and the protected
    /// tail is left alone even over budget, since a single oversized
    /// message cannot be shrunk by summarization.
    pub async fn compact_if_needed(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<Option<CompactionOutcome>> {
        let tokens_before = self.estimated_tokens();
        tracing::debug!(tokens = tokens_before, budget = self.config.max_tokens, "budget check");
        if tokens_before <= self.config.max_tokens {
            return Ok(None);
        }

        let messages = self.store.messages();
        let has_system = matches!(messages.first(), Some(m) if m.role == Role::System);
        let body_start = if has_system { 1 } else { 0 };
        let body = &messages[body_start..];

        if body.len() <= self.config.protected_tail {
            tracing::debug!("over budget but no old segment to compact");
            return Ok(None);
        }

        let split = body.len() - self.config.protected_tail;
        let old_segment: Vec<Message> = body[..split].to_vec();
        let tail: Vec<Message> = body[split..].to_vec();
        let system = has_system.then(|| messages[0].clone());

        let summary = self.summarize(client, old_segment.clone()).await?;

        let mut rebuilt = Vec::with_capacity(2 + tail.len());
        if let Some(system) = system {
            rebuilt.push(system);
        }
        rebuilt.push(Message::assistant(format!("{}{}", SUMMARY_PREFIX, summary)));
        rebuilt.extend(tail);
        self.store.replace_all(rebuilt);

        let tokens_after = self.estimated_tokens();
        tracing::info!(
            summarized = old_segment.len(),
            tokens_before,
            tokens_after,
            "compacted conversation history"
        );

        Ok(Some(CompactionOutcome {
            summarized_messages: old_segment.len(),
            tokens_before,
            tokens_after,
        }))
    }

    /// Invoke a summarization completion over the old segment alone
    async fn summarize(
        &self,
        client: &dyn CompletionClient,
        old_segment: Vec<Message>,
    ) -> Result<String> {
        let mut input = Vec::with_capacity(old_segment.len() + 1);
        input.push(Message::system(SUMMARY_SYSTEM_PROMPT));
        input.extend(old_segment);

        let request = CompletionRequest::new(&self.summary_model, input);
        let reply = client
            .complete(&request)
            .await
            .map_err(|e| Error::Compaction(format!("summarization call failed: {}", e)))?;

        if reply.text.is_empty() {
            return Err(Error::Compaction(
                "summarization returned an empty response".to_string(),
            ));
        }
        Ok(reply.text)
    }
}
