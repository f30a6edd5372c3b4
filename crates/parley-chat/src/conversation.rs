//! Conversation store: the ordered message log for one session
//!
//! Pure data structure with invariants; owns no I/O. The first message, when
//! present, is the singular system message. Order is the only thing that
//! encodes turn structure.

use parley_ai::{Body, Message, Role};

/// Ordered, mutable log of role-tagged messages for one chat session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Create a store seeded with a system message
    pub fn new(system_text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_text)],
        }
    }

    /// Reconstruct a store from persisted messages (wholesale replacement
    /// on session load)
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message to the end
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Set or overwrite the singular system message. Updates in place when
    /// one exists, otherwise inserts at position 0.
    pub fn replace_system(&mut self, text: impl Into<String>) {
        if let Some(first) = self.messages.first_mut() {
            if first.role == Role::System {
                first.content = Body::Text(text.into());
                return;
            }
        }
        self.messages.insert(0, Message::system(text));
    }

    /// Clear all messages and re-seed with a fresh system message
    pub fn reset(&mut self, system_text: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::system(system_text));
    }

    /// An immutable ordered copy suitable for transmission or serialization.
    /// Later mutation of the store does not affect the snapshot.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Replace the entire message sequence. Used by compaction to install
    /// the reassembled history.
    pub(crate) fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// View the live message sequence
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The system message text, if one is present
    pub fn system_text(&self) -> Option<String> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_ai::Body;

    #[test]
    fn test_new_seeds_system_message() {
        let store = ConversationStore::new("be helpful");
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].role, Role::System);
        assert_eq!(store.system_text().as_deref(), Some("be helpful"));
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = ConversationStore::new("sys");
        store.append(Message::user("first"));
        store.append(Message::assistant("second"));
        store.append(Message::user("third"));
        let texts: Vec<String> = store.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["sys", "first", "second", "third"]);
    }

    #[test]
    fn test_replace_system_updates_in_place() {
        let mut store = ConversationStore::new("old prompt");
        store.append(Message::user("hi"));
        store.append(Message::assistant("hello"));

        store.replace_system("new prompt");

        assert_eq!(store.len(), 3);
        assert_eq!(store.system_text().as_deref(), Some("new prompt"));
        assert_eq!(store.messages()[1].text(), "hi");
        assert_eq!(store.messages()[2].text(), "hello");
    }

    #[test]
    fn test_replace_system_on_empty_store_inserts() {
        let mut store = ConversationStore::default();
        store.replace_system("prompt");
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].role, Role::System);
    }

    #[test]
    fn test_replace_system_inserts_when_first_is_not_system() {
        let mut store = ConversationStore::from_messages(vec![Message::user("orphan")]);
        store.replace_system("prompt");
        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].role, Role::System);
        assert_eq!(store.messages()[1].text(), "orphan");
    }

    #[test]
    fn test_repeated_replace_system_keeps_single_system_message() {
        let mut store = ConversationStore::new("a");
        store.append(Message::user("hi"));
        for text in ["b", "c", "d"] {
            store.replace_system(text);
        }
        let system_count = store
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(store.messages()[0].role, Role::System);
        assert_eq!(store.system_text().as_deref(), Some("d"));
    }

    #[test]
    fn test_reset_clears_and_reseeds() {
        let mut store = ConversationStore::new("sys");
        store.append(Message::user("hi"));
        store.append(Message::assistant("hello"));

        store.reset("fresh");

        assert_eq!(store.len(), 1);
        assert_eq!(store.system_text().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_snapshot_has_copy_semantics() {
        let mut store = ConversationStore::new("sys");
        store.append(Message::user("hi"));

        let snapshot = store.snapshot();
        store.append(Message::assistant("later"));
        store.replace_system("mutated");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].content, Body::Text("sys".to_string()));
        assert_eq!(snapshot[1].text(), "hi");
    }

    #[test]
    fn test_no_alternation_enforced() {
        // Two user messages in a row are legal; correctness relies on role
        // tags only.
        let mut store = ConversationStore::new("sys");
        store.append(Message::user("one"));
        store.append(Message::user("two"));
        assert_eq!(store.len(), 3);
    }
}
