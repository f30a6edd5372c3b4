//! parley-chat: conversation memory core
//!
//! This crate owns the ordered message history for one chat session and
//! keeps its estimated token cost bounded: when the history outgrows the
//! configured budget, older turns are collapsed into a single summary
//! message while a protected recent tail is preserved verbatim.

pub mod citations;
pub mod conversation;
pub mod error;
pub mod events;
pub mod memory;
pub mod request;

pub use conversation::ConversationStore;
pub use error::{Error, Result};
pub use events::{CompactionOutcome, TurnOutcome};
pub use memory::{MemoryConfig, MemoryManager};
pub use request::RequestBuilder;
