//! crates/finance_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the assistant's conversation
//! state. These structs are independent of the web host and of any
//! serialization beyond the wire format the host relays verbatim.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

/// A single immutable entry in the conversation transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Utterance {
    /// Monotonically increasing within one conversation, assigned at
    /// insertion time. Not stable across conversation restarts.
    pub id: u64,
    pub text: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
}

/// Marker for an in-flight, not-yet-delivered assistant reply. Created when
/// a user utterance is accepted, destroyed when the reply is appended.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub for_utterance_id: u64,
    pub scheduled_at: DateTime<Utc>,
    pub ready_at: DateTime<Utc>,
}

/// An ordered, append-only sequence of utterances owned by one chat session.
///
/// Invariants: `id` values are strictly increasing regardless of origin,
/// timestamps are non-decreasing, the first utterance is always the
/// assistant greeting, and no user utterance is ever empty after trimming
/// (the engine guards this before appending).
#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    utterances: Vec<Utterance>,
    next_id: u64,
}

impl Conversation {
    /// Creates a conversation seeded with the assistant greeting.
    pub fn new(greeting: &str) -> Self {
        let mut conversation = Self {
            id: Uuid::new_v4(),
            utterances: Vec::new(),
            next_id: 1,
        };
        conversation.append(Origin::Assistant, greeting);
        conversation
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Appends an utterance and returns a clone of the stored record.
    ///
    /// The caller is responsible for the non-empty-after-trim guard on user
    /// text; this method only enforces the ordering invariants.
    pub fn append(&mut self, origin: Origin, text: &str) -> Utterance {
        // Wall clocks can step backwards; clamp so timestamps stay
        // non-decreasing within the transcript.
        let now = Utc::now();
        let timestamp = match self.utterances.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let utterance = Utterance {
            id: self.next_id,
            text: text.to_string(),
            origin,
            timestamp,
        };
        self.next_id += 1;
        self.utterances.push(utterance.clone());
        utterance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_starts_with_assistant_greeting() {
        let conversation = Conversation::new("Hello!");
        assert_eq!(conversation.len(), 1);
        let first = &conversation.utterances()[0];
        assert_eq!(first.origin, Origin::Assistant);
        assert_eq!(first.text, "Hello!");
        assert_eq!(first.id, 1);
    }

    #[test]
    fn ids_increase_strictly_across_origins() {
        let mut conversation = Conversation::new("Hello!");
        conversation.append(Origin::User, "first");
        conversation.append(Origin::Assistant, "reply");
        conversation.append(Origin::User, "second");

        let ids: Vec<u64> = conversation.utterances().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn timestamps_never_decrease() {
        let mut conversation = Conversation::new("Hello!");
        for i in 0..10 {
            conversation.append(Origin::User, &format!("message {i}"));
        }
        let stamps: Vec<_> = conversation
            .utterances()
            .iter()
            .map(|u| u.timestamp)
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
