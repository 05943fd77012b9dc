//! Thread entity: one two-party conversation and its local message list.
//!
//! # Ordering
//!
//! Display order is append order. A full reload replaces the list, inserts
//! only append, and nothing re-sorts by timestamp.
//!
//! # Revision
//!
//! `revision` is the newest server timestamp applied to the thread. A reload
//! never drops confirmed messages newer than the newest message it carries,
//! so a slow fetch that resolves after a socket delivery cannot roll the
//! thread back.

use std::collections::HashSet;

use crate::domain::foundation::{MessageId, ThreadId, Timestamp, UserId};

use super::message::{DeliveryState, Message};
use super::participant::{Participant, ParticipantSource};

/// Thread metadata as returned by a thread-list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub participant_ids: Vec<UserId>,
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub unread_count: u32,
}

impl ThreadSummary {
    /// Creates metadata for a thread with no messages yet.
    pub fn new(id: ThreadId, participant_ids: Vec<UserId>) -> Self {
        Self {
            id,
            participant_ids,
            last_message: None,
            last_message_at: None,
            unread_count: 0,
        }
    }
}

/// Result of merging a full message reload into a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadOutcome {
    /// Messages taken from the reload.
    pub fetched: usize,
    /// Confirmed local messages kept because they are newer than the reload.
    pub kept_newer: usize,
    /// Pending or failed local sends carried over.
    pub kept_local: usize,
    /// Pending local sends dropped because the reload already holds their
    /// server copy.
    pub settled_local: usize,
}

/// A conversation between exactly two participants.
#[derive(Debug, Clone)]
pub struct Thread {
    id: ThreadId,
    participant_ids: Vec<UserId>,
    participant: Option<(Participant, ParticipantSource)>,
    messages: Vec<Message>,
    unread_count: u32,
    last_message: Option<String>,
    last_message_at: Option<Timestamp>,
    revision: Option<Timestamp>,
}

impl Thread {
    /// Creates a thread from server metadata.
    pub fn from_summary(summary: ThreadSummary) -> Self {
        Self {
            id: summary.id,
            participant_ids: summary.participant_ids,
            participant: None,
            messages: Vec::new(),
            unread_count: summary.unread_count,
            last_message: summary.last_message,
            last_message_at: summary.last_message_at,
            revision: None,
        }
    }

    /// Creates a placeholder entry for a thread only known from a push.
    pub fn stub(id: ThreadId) -> Self {
        Self::from_summary(ThreadSummary::new(id, Vec::new()))
    }

    pub fn id(&self) -> &ThreadId {
        &self.id
    }

    pub fn participant_ids(&self) -> &[UserId] {
        &self.participant_ids
    }

    /// Cached identity of the other party, if resolved.
    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref().map(|(p, _)| p)
    }

    pub fn participant_source(&self) -> Option<ParticipantSource> {
        self.participant.as_ref().map(|(_, source)| *source)
    }

    /// Caches the other party's identity. A placeholder never replaces a
    /// resolved identity.
    pub fn set_participant(&mut self, participant: Participant, source: ParticipantSource) {
        let resolved = self
            .participant_source()
            .map_or(false, |current| current != ParticipantSource::Placeholder);
        if source == ParticipantSource::Placeholder && resolved {
            return;
        }
        self.participant = Some((participant, source));
    }

    /// True while the other party is unknown or only shown as a placeholder.
    pub fn needs_participant(&self) -> bool {
        !self.participant_ids.is_empty()
            && self
                .participant_source()
                .map_or(true, |source| source == ParticipantSource::Placeholder)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn last_message_at(&self) -> Option<&Timestamp> {
        self.last_message_at.as_ref()
    }

    /// Newest server timestamp applied to this thread.
    pub fn revision(&self) -> Option<&Timestamp> {
        self.revision.as_ref()
    }

    /// Applies refreshed metadata, keeping loaded messages and the cached
    /// participant.
    pub fn apply_summary(&mut self, summary: ThreadSummary) {
        if !summary.participant_ids.is_empty() {
            self.participant_ids = summary.participant_ids;
        }
        self.unread_count = summary.unread_count;
        self.last_message = summary.last_message;
        self.last_message_at = summary.last_message_at;
    }

    /// Returns true if a message with `id` is in the list.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Looks up a message by id.
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Appends a confirmed message unless its id is already present.
    ///
    /// Returns false for duplicates.
    pub fn insert_confirmed(&mut self, mut message: Message) -> bool {
        if self.contains(&message.id) {
            return false;
        }
        message.state = DeliveryState::Confirmed;
        self.note_confirmed(&message);
        self.messages.push(message);
        true
    }

    /// Appends an optimistic local message.
    pub fn push_local(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the local message `local_id` with its server confirmation.
    ///
    /// The confirmation takes the local message's position. If the confirmed
    /// id is already present (a reload got there first) the local copy is
    /// simply removed. Returns false if `local_id` is unknown.
    pub fn confirm_local(&mut self, local_id: &MessageId, confirmed: Message) -> bool {
        let Some(pos) = self.messages.iter().position(|m| &m.id == local_id) else {
            return false;
        };
        if self.contains(&confirmed.id) {
            self.messages.remove(pos);
            return true;
        }
        let mut confirmed = confirmed;
        confirmed.state = DeliveryState::Confirmed;
        self.note_confirmed(&confirmed);
        self.messages[pos] = confirmed;
        true
    }

    /// Sets the delivery state of a local message.
    ///
    /// Returns false if `local_id` is not a local message of this thread.
    pub fn set_local_state(&mut self, local_id: &MessageId, state: DeliveryState) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| &m.id == local_id && m.is_local())
        {
            Some(message) => {
                message.state = state;
                true
            }
            None => false,
        }
    }

    /// Removes a local message, returning it.
    pub fn remove_local(&mut self, local_id: &MessageId) -> Option<Message> {
        let pos = self
            .messages
            .iter()
            .position(|m| &m.id == local_id && m.is_local())?;
        Some(self.messages.remove(pos))
    }

    /// Merges a full reload of the thread's messages.
    ///
    /// The reload becomes the new list, followed by confirmed local messages
    /// newer than anything in the reload, followed by pending and failed
    /// local sends.
    ///
    /// A pending send is dropped when the reload carries a message from the
    /// same sender with the same text created no earlier than the send, so
    /// the temporary never sits next to its own server copy. Each fetched
    /// message settles at most one pending send.
    pub fn replace_messages(&mut self, fetched: Vec<Message>) -> ReloadOutcome {
        let mut seen: HashSet<MessageId> = HashSet::with_capacity(fetched.len());
        let mut merged: Vec<Message> = Vec::with_capacity(fetched.len() + self.messages.len());

        for mut message in fetched {
            if message.is_local() || !seen.insert(message.id.clone()) {
                continue;
            }
            message.state = DeliveryState::Confirmed;
            merged.push(message);
        }
        let fetched_count = merged.len();
        let fetched_latest = merged.iter().map(|m| m.created_at).max();

        let previous = std::mem::take(&mut self.messages);
        let (local, confirmed): (Vec<Message>, Vec<Message>) =
            previous.into_iter().partition(|m| m.is_local());

        let mut kept_newer = 0;
        for message in confirmed {
            if seen.contains(&message.id) {
                continue;
            }
            let newer = fetched_latest.map_or(true, |latest| message.created_at.is_after(&latest));
            if newer {
                seen.insert(message.id.clone());
                merged.push(message);
                kept_newer += 1;
            }
        }

        let mut claimed = vec![false; fetched_count];
        let mut settled_local = 0;
        for message in local {
            if message.state == DeliveryState::Pending {
                let server_copy = (0..fetched_count).find(|&i| {
                    let m = &merged[i];
                    !claimed[i]
                        && m.sender_id == message.sender_id
                        && m.text == message.text
                        && !message.created_at.is_after(&m.created_at)
                });
                if let Some(i) = server_copy {
                    claimed[i] = true;
                    settled_local += 1;
                    continue;
                }
            }
            merged.push(message);
        }
        let kept_local = merged.iter().filter(|m| m.is_local()).count();
        self.messages = merged;

        if let Some(latest) = fetched_latest {
            self.bump_revision(latest);
        }
        if let Some(last) = self.messages.iter().rev().find(|m| !m.is_local()) {
            self.last_message = Some(last.text.clone());
            self.last_message_at = Some(last.created_at);
        }

        ReloadOutcome {
            fetched: fetched_count,
            kept_newer,
            kept_local,
            settled_local,
        }
    }

    /// Local messages still waiting for, or having failed, confirmation.
    pub fn local_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_local())
    }

    /// Id of the newest confirmed message, used as the read marker.
    pub fn last_confirmed_id(&self) -> Option<&MessageId> {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.is_local())
            .map(|m| &m.id)
    }

    pub fn increment_unread(&mut self) {
        self.unread_count = self.unread_count.saturating_add(1);
    }

    pub fn clear_unread(&mut self) {
        self.unread_count = 0;
    }

    fn note_confirmed(&mut self, message: &Message) {
        self.bump_revision(message.created_at);
        self.last_message = Some(message.text.clone());
        self.last_message_at = Some(message.created_at);
    }

    fn bump_revision(&mut self, at: Timestamp) {
        if self.revision.map_or(true, |current| at.is_after(&current)) {
            self.revision = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid() -> ThreadId {
        ThreadId::new("t-1").unwrap()
    }

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_millis(1_700_000_000_000).unwrap().plus_secs(secs)
    }

    fn confirmed(id: &str, secs: i64) -> Message {
        Message::confirmed(
            MessageId::server(id).unwrap(),
            tid(),
            uid("bob"),
            format!("text {}", id),
            at(secs),
        )
    }

    fn ids(thread: &Thread) -> Vec<String> {
        thread.messages().iter().map(|m| m.id.to_string()).collect()
    }

    #[test]
    fn insert_confirmed_deduplicates_by_id() {
        let mut thread = Thread::stub(tid());
        assert!(thread.insert_confirmed(confirmed("m1", 1)));
        assert!(!thread.insert_confirmed(confirmed("m1", 1)));
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.revision(), Some(&at(1)));
        assert_eq!(thread.last_message(), Some("text m1"));
    }

    #[test]
    fn confirm_local_replaces_in_place() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("m1", 1));
        let local = Message::optimistic(tid(), uid("me"), "hello");
        let local_id = local.id.clone();
        thread.push_local(local);
        thread.insert_confirmed(confirmed("m2", 3));

        assert!(thread.confirm_local(&local_id, confirmed("m9", 2)));
        assert_eq!(ids(&thread), vec!["m1", "m9", "m2"]);
        assert_eq!(thread.local_messages().count(), 0);
    }

    #[test]
    fn confirm_local_drops_copy_when_confirmation_already_present() {
        let mut thread = Thread::stub(tid());
        let local = Message::optimistic(tid(), uid("me"), "hello");
        let local_id = local.id.clone();
        thread.push_local(local);
        thread.insert_confirmed(confirmed("m1", 1));

        assert!(thread.confirm_local(&local_id, confirmed("m1", 1)));
        assert_eq!(ids(&thread), vec!["m1"]);
    }

    #[test]
    fn confirm_local_unknown_id_is_rejected() {
        let mut thread = Thread::stub(tid());
        assert!(!thread.confirm_local(&MessageId::temporary(), confirmed("m1", 1)));
        assert!(thread.messages().is_empty());
    }

    #[test]
    fn replace_messages_replaces_older_confirmed_list() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("old", 1));

        let outcome = thread.replace_messages(vec![confirmed("a", 2), confirmed("b", 3)]);

        assert_eq!(ids(&thread), vec!["a", "b"]);
        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.kept_newer, 0);
    }

    #[test]
    fn replace_messages_keeps_newer_socket_deliveries() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("pushed", 10));

        let outcome = thread.replace_messages(vec![confirmed("a", 1), confirmed("b", 2)]);

        assert_eq!(ids(&thread), vec!["a", "b", "pushed"]);
        assert_eq!(outcome.kept_newer, 1);
        assert_eq!(thread.revision(), Some(&at(10)));
    }

    #[test]
    fn replace_messages_carries_local_sends() {
        let mut thread = Thread::stub(tid());
        let local = Message::optimistic(tid(), uid("me"), "pending");
        thread.push_local(local);

        let outcome = thread.replace_messages(vec![confirmed("a", 1)]);

        assert_eq!(outcome.kept_local, 1);
        assert_eq!(thread.messages().len(), 2);
        assert!(thread.messages()[1].is_local());
    }

    #[test]
    fn replace_messages_ignores_duplicate_ids_in_reload() {
        let mut thread = Thread::stub(tid());
        thread.replace_messages(vec![confirmed("a", 1), confirmed("a", 1)]);
        assert_eq!(ids(&thread), vec!["a"]);
    }

    #[test]
    fn apply_summary_preserves_messages_and_participant() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("a", 1));
        thread.set_participant(Participant::placeholder(uid("bob")), ParticipantSource::Placeholder);

        let mut summary = ThreadSummary::new(tid(), vec![uid("me"), uid("bob")]);
        summary.unread_count = 4;
        thread.apply_summary(summary);

        assert_eq!(thread.messages().len(), 1);
        assert!(thread.participant().is_some());
        assert_eq!(thread.unread_count(), 4);
        assert_eq!(thread.participant_ids().len(), 2);
    }

    #[test]
    fn placeholder_participant_still_needs_resolution() {
        let mut thread = Thread::from_summary(ThreadSummary::new(tid(), vec![uid("me"), uid("bob")]));
        assert!(thread.needs_participant());

        thread.set_participant(Participant::placeholder(uid("bob")), ParticipantSource::Placeholder);
        assert!(thread.needs_participant());

        thread.set_participant(Participant::new(uid("bob"), "Bob", None), ParticipantSource::Friend);
        assert!(!thread.needs_participant());
        assert_eq!(thread.participant_source(), Some(ParticipantSource::Friend));

        thread.set_participant(Participant::placeholder(uid("bob")), ParticipantSource::Placeholder);
        assert_eq!(thread.participant().unwrap().display_name, "Bob");
    }

    #[test]
    fn stub_without_participant_ids_needs_nothing() {
        assert!(!Thread::stub(tid()).needs_participant());
    }

    #[test]
    fn reload_settles_pending_send_already_confirmed_by_server() {
        let mut thread = Thread::stub(tid());
        let local = Message::optimistic(tid(), uid("me"), "hello");
        let local_id = local.id.clone();
        thread.push_local(local);

        let server_copy = Message::confirmed(
            MessageId::server("m-7").unwrap(),
            tid(),
            uid("me"),
            "hello",
            Timestamp::now().plus_secs(1),
        );
        let outcome = thread.replace_messages(vec![server_copy.clone()]);

        assert_eq!(ids(&thread), vec!["m-7"]);
        assert_eq!(outcome.settled_local, 1);
        assert_eq!(outcome.kept_local, 0);

        // The in-flight send completing afterwards finds nothing to swap.
        assert!(!thread.confirm_local(&local_id, server_copy));
        assert_eq!(ids(&thread), vec!["m-7"]);
    }

    #[test]
    fn reload_keeps_pending_send_with_older_matching_text() {
        let mut thread = Thread::stub(tid());
        thread.push_local(Message::optimistic(tid(), uid("me"), "hello"));
        let earlier = Message::confirmed(
            MessageId::server("m-1").unwrap(),
            tid(),
            uid("me"),
            "hello",
            at(0),
        );

        let outcome = thread.replace_messages(vec![earlier]);

        assert_eq!(outcome.settled_local, 0);
        assert_eq!(outcome.kept_local, 1);
        assert_eq!(thread.messages().len(), 2);
    }

    #[test]
    fn reload_never_settles_failed_sends() {
        let mut thread = Thread::stub(tid());
        let local = Message::optimistic(tid(), uid("me"), "hello");
        let local_id = local.id.clone();
        thread.push_local(local);
        thread.set_local_state(&local_id, DeliveryState::Failed);

        let outcome = thread.replace_messages(vec![Message::confirmed(
            MessageId::server("m-7").unwrap(),
            tid(),
            uid("me"),
            "hello",
            Timestamp::now().plus_secs(1),
        )]);

        assert_eq!(outcome.kept_local, 1);
        assert!(thread.message(&local_id).is_some());
    }

    #[test]
    fn last_confirmed_id_skips_local_messages() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("a", 1));
        thread.push_local(Message::optimistic(tid(), uid("me"), "x"));
        assert_eq!(thread.last_confirmed_id(), Some(&MessageId::server("a").unwrap()));
    }

    #[test]
    fn set_local_state_only_touches_local_messages() {
        let mut thread = Thread::stub(tid());
        thread.insert_confirmed(confirmed("a", 1));
        let server_id = MessageId::server("a").unwrap();
        assert!(!thread.set_local_state(&server_id, DeliveryState::Failed));

        let local = Message::optimistic(tid(), uid("me"), "x");
        let local_id = local.id.clone();
        thread.push_local(local);
        assert!(thread.set_local_state(&local_id, DeliveryState::Failed));
        assert_eq!(thread.message(&local_id).map(|m| m.state), Some(DeliveryState::Failed));
    }
}
