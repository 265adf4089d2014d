//! # Message Store
//!
//! Local, ordered cache of one channel's messages.
//!
//! Messages are kept newest-first. After every mutation the ids are strictly
//! decreasing and unique, and `newest_fetched` is the id of the first
//! element. Message ids are ULIDs, so comparing ids compares creation time.

use log::warn;

use crate::client::{Message, MessageId};

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    newest_fetched: Option<MessageId>,
    /// Refreshes that came back full, so older messages may have been skipped.
    possible_gaps: usize,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// All messages, newest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Cursor for the next incremental fetch.
    pub fn newest_fetched(&self) -> Option<&MessageId> {
        self.newest_fetched.as_ref()
    }

    pub fn possible_gaps(&self) -> usize {
        self.possible_gaps
    }

    /// Replaces the contents with an initial batch.
    pub fn install(&mut self, batch: Vec<Message>) {
        self.messages = batch;
        self.normalize();
    }

    /// Merges a batch of messages newer than the cursor.
    ///
    /// Returns `false` (and changes nothing) for an empty batch. A batch of
    /// `limit` or more messages probably did not reach back to the cursor;
    /// that is counted in `possible_gaps` rather than backfilled.
    pub fn prepend_newer(&mut self, batch: Vec<Message>, limit: usize) -> bool {
        if batch.is_empty() {
            return false;
        }
        if batch.len() >= limit {
            self.possible_gaps += 1;
            warn!(
                "Refresh returned a full batch of {} messages, older messages may be missing",
                batch.len()
            );
        }

        let mut merged = batch;
        merged.append(&mut self.messages);
        self.messages = merged;
        self.normalize();
        true
    }

    /// Records a message this client just sent.
    pub fn record_sent(&mut self, message: Message) {
        self.messages.insert(0, message);
        self.normalize();
    }

    /// The newest `n` messages in display order (oldest first).
    pub fn recent(&self, n: usize) -> Vec<Message> {
        let take = n.min(self.messages.len());
        self.messages[..take].iter().rev().cloned().collect()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.newest_fetched = None;
    }

    // Stable sort keeps the earlier (incoming) copy first, so dedup keeps it.
    fn normalize(&mut self) {
        self.messages.sort_by(|a, b| b.id.cmp(&a.id));
        self.messages.dedup_by(|later, earlier| later.id == earlier.id);
        self.newest_fetched = self.messages.first().map(|m| m.id.clone());
    }
}
