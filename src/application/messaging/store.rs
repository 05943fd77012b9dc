//! Thread/message store: the single owner of thread and message state.
//!
//! A plain state machine with no I/O. The messaging service wraps it in a
//! lock and feeds it REST results and real-time pushes in whatever order
//! they arrive; the per-thread revision makes the result independent of
//! that order.

use std::collections::HashMap;

use crate::domain::foundation::{MessageId, ThreadId, UserId};
use crate::domain::messaging::{
    DeliveryState, Message, Participant, ParticipantSource, ReloadOutcome, Thread, ThreadSummary,
};

use super::errors::MessagingError;

/// What `append_message` did with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Sent by the current user; ignored.
    Echo,
    /// Already present; ignored.
    Duplicate,
    Inserted {
        /// The thread was not focused, so its unread counter went up.
        unread_incremented: bool,
        /// The thread was unknown and an entry was created for it.
        created_thread: bool,
    },
}

/// All threads of the session, in server list order.
#[derive(Debug, Default)]
pub struct ThreadStore {
    order: Vec<ThreadId>,
    threads: HashMap<ThreadId, Thread>,
    active: Option<ThreadId>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════

    pub fn thread(&self, thread_id: &ThreadId) -> Option<&Thread> {
        self.threads.get(thread_id)
    }

    /// Threads in display order.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.order.iter().filter_map(|id| self.threads.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn active_thread(&self) -> Option<&ThreadId> {
        self.active.as_ref()
    }

    /// Sum of unread counters, for the badge.
    pub fn total_unread(&self) -> u32 {
        self.threads
            .values()
            .fold(0u32, |sum, t| sum.saturating_add(t.unread_count()))
    }

    /// Threads whose other party is unknown or only a placeholder.
    pub fn unresolved_participants(&self) -> Vec<(ThreadId, Vec<UserId>)> {
        self.threads()
            .filter(|t| t.needs_participant())
            .map(|t| (t.id().clone(), t.participant_ids().to_vec()))
            .collect()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Thread list
    // ════════════════════════════════════════════════════════════════════════

    /// Replaces the thread list with the server's view.
    ///
    /// Known threads keep their loaded messages and cached participant.
    /// Threads missing from the list are dropped unless they hold
    /// messages, since the client never deletes a conversation.
    pub fn replace_threads(&mut self, summaries: Vec<ThreadSummary>) {
        let mut previous = std::mem::take(&mut self.threads);
        let previous_order = std::mem::take(&mut self.order);

        for summary in summaries {
            if self.threads.contains_key(&summary.id) {
                continue;
            }
            let id = summary.id.clone();
            let thread = match previous.remove(&id) {
                Some(mut existing) => {
                    existing.apply_summary(summary);
                    existing
                }
                None => Thread::from_summary(summary),
            };
            self.order.push(id.clone());
            self.threads.insert(id, thread);
        }

        for id in previous_order {
            if let Some(thread) = previous.remove(&id) {
                if !thread.messages().is_empty() {
                    tracing::debug!(thread_id = %id, "keeping thread absent from list fetch");
                    self.order.push(id.clone());
                    self.threads.insert(id, thread);
                }
            }
        }
    }

    /// Inserts or refreshes a single thread. Returns true if it was new.
    pub fn upsert_thread(&mut self, summary: ThreadSummary) -> bool {
        match self.threads.get_mut(&summary.id) {
            Some(existing) => {
                existing.apply_summary(summary);
                false
            }
            None => {
                let id = summary.id.clone();
                self.order.insert(0, id.clone());
                self.threads.insert(id, Thread::from_summary(summary));
                true
            }
        }
    }

    pub fn set_participant(
        &mut self,
        thread_id: &ThreadId,
        participant: Participant,
        source: ParticipantSource,
    ) -> bool {
        match self.threads.get_mut(thread_id) {
            Some(thread) => {
                thread.set_participant(participant, source);
                true
            }
            None => false,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Messages
    // ════════════════════════════════════════════════════════════════════════

    /// Merges a full reload of a thread's messages.
    pub fn replace_messages(&mut self, thread_id: &ThreadId, messages: Vec<Message>) -> ReloadOutcome {
        self.thread_entry(thread_id).replace_messages(messages)
    }

    /// Appends an optimistic message and returns a copy of it.
    pub fn push_optimistic(
        &mut self,
        thread_id: &ThreadId,
        sender_id: &UserId,
        text: &str,
    ) -> Result<Message, MessagingError> {
        let thread = self.thread_mut(thread_id)?;
        let message = Message::optimistic(thread_id.clone(), sender_id.clone(), text);
        thread.push_local(message.clone());
        Ok(message)
    }

    /// Swaps a local message for its server confirmation.
    pub fn confirm_send(&mut self, thread_id: &ThreadId, local_id: &MessageId, confirmed: Message) -> bool {
        self.threads
            .get_mut(thread_id)
            .map_or(false, |t| t.confirm_local(local_id, confirmed))
    }

    /// Marks a local message as failed.
    pub fn fail_send(&mut self, thread_id: &ThreadId, local_id: &MessageId) -> bool {
        self.threads
            .get_mut(thread_id)
            .map_or(false, |t| t.set_local_state(local_id, DeliveryState::Failed))
    }

    /// Moves a failed message back to pending and returns its text.
    pub fn begin_retry(
        &mut self,
        thread_id: &ThreadId,
        local_id: &MessageId,
    ) -> Result<String, MessagingError> {
        let text = self.failed_message(thread_id, local_id)?.text.clone();
        self.thread_mut(thread_id)?
            .set_local_state(local_id, DeliveryState::Pending);
        Ok(text)
    }

    /// Removes a failed message.
    pub fn discard_failed(
        &mut self,
        thread_id: &ThreadId,
        local_id: &MessageId,
    ) -> Result<Message, MessagingError> {
        self.failed_message(thread_id, local_id)?;
        self.thread_mut(thread_id)?
            .remove_local(local_id)
            .ok_or_else(|| MessagingError::MessageNotFound {
                thread_id: thread_id.clone(),
                message_id: local_id.clone(),
            })
    }

    /// Applies an inbound message.
    ///
    /// - Sender is `current_user`: ignored (own echo)
    /// - Id already present: ignored
    /// - Otherwise appended; unread goes up unless the thread is active
    pub fn append_message(
        &mut self,
        thread_id: &ThreadId,
        mut message: Message,
        current_user: &UserId,
    ) -> AppendOutcome {
        if message.is_from(current_user) {
            return AppendOutcome::Echo;
        }

        let created_thread = !self.threads.contains_key(thread_id);
        let is_active = self.active.as_ref() == Some(thread_id);
        message.thread_id = thread_id.clone();

        if created_thread {
            tracing::debug!(thread_id = %thread_id, "creating thread from push");
            self.upsert_thread(ThreadSummary::new(
                thread_id.clone(),
                vec![current_user.clone(), message.sender_id.clone()],
            ));
        }

        let thread = self.thread_entry(thread_id);
        if !thread.insert_confirmed(message) {
            return AppendOutcome::Duplicate;
        }
        if !is_active {
            thread.increment_unread();
        }

        AppendOutcome::Inserted {
            unread_incremented: !is_active,
            created_thread,
        }
    }

    /// Zeroes the unread counter and returns the newest confirmed id.
    pub fn clear_unread(&mut self, thread_id: &ThreadId) -> Result<Option<MessageId>, MessagingError> {
        let thread = self.thread_mut(thread_id)?;
        thread.clear_unread();
        Ok(thread.last_confirmed_id().cloned())
    }

    /// Switches focus. Does not clear unread. Returns the previous focus.
    pub fn set_active_thread(&mut self, thread_id: Option<ThreadId>) -> Option<ThreadId> {
        std::mem::replace(&mut self.active, thread_id)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Internals
    // ════════════════════════════════════════════════════════════════════════

    fn thread_mut(&mut self, thread_id: &ThreadId) -> Result<&mut Thread, MessagingError> {
        self.threads
            .get_mut(thread_id)
            .ok_or_else(|| MessagingError::ThreadNotFound(thread_id.clone()))
    }

    fn thread_entry(&mut self, thread_id: &ThreadId) -> &mut Thread {
        if !self.threads.contains_key(thread_id) {
            tracing::debug!(thread_id = %thread_id, "creating stub thread");
            self.order.insert(0, thread_id.clone());
        }
        self.threads
            .entry(thread_id.clone())
            .or_insert_with(|| Thread::stub(thread_id.clone()))
    }

    fn failed_message(
        &self,
        thread_id: &ThreadId,
        local_id: &MessageId,
    ) -> Result<&Message, MessagingError> {
        let thread = self
            .threads
            .get(thread_id)
            .ok_or_else(|| MessagingError::ThreadNotFound(thread_id.clone()))?;
        let message = thread
            .message(local_id)
            .filter(|m| m.is_local())
            .ok_or_else(|| MessagingError::MessageNotFound {
                thread_id: thread_id.clone(),
                message_id: local_id.clone(),
            })?;
        if message.state != DeliveryState::Failed {
            return Err(MessagingError::NotFailed(local_id.clone()));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use proptest::prelude::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn tid(s: &str) -> ThreadId {
        ThreadId::new(s).unwrap()
    }

    fn me() -> UserId {
        uid("me")
    }

    fn inbound(id: &str, thread: &str, secs: i64) -> Message {
        Message::confirmed(
            MessageId::server(id).unwrap(),
            tid(thread),
            uid("peer"),
            format!("msg {}", id),
            Timestamp::from_unix_millis(1_700_000_000_000).unwrap().plus_secs(secs),
        )
    }

    fn summary(id: &str) -> ThreadSummary {
        ThreadSummary::new(tid(id), vec![me(), uid("peer")])
    }

    fn store_with(ids: &[&str]) -> ThreadStore {
        let mut store = ThreadStore::new();
        store.replace_threads(ids.iter().map(|id| summary(id)).collect());
        store
    }

    #[test]
    fn replace_threads_keeps_loaded_messages() {
        let mut store = store_with(&["t-1"]);
        let messages: Vec<Message> = (0..5).map(|i| inbound(&format!("m-{}", i), "t-1", i)).collect();
        store.replace_messages(&tid("t-1"), messages);

        let mut refreshed = summary("t-1");
        refreshed.unread_count = 3;
        store.replace_threads(vec![refreshed]);

        let thread = store.thread(&tid("t-1")).unwrap();
        assert_eq!(thread.messages().len(), 5);
        assert_eq!(thread.unread_count(), 3);
    }

    #[test]
    fn replace_threads_keeps_cached_participant() {
        let mut store = store_with(&["t-1"]);
        store.set_participant(
            &tid("t-1"),
            Participant::new(uid("peer"), "Pete", None),
            ParticipantSource::Directory,
        );

        store.replace_threads(vec![summary("t-1")]);

        assert_eq!(
            store.thread(&tid("t-1")).unwrap().participant().unwrap().display_name,
            "Pete"
        );
    }

    #[test]
    fn placeholder_threads_stay_unresolved() {
        let mut store = store_with(&["t-1", "t-2"]);
        store.set_participant(
            &tid("t-1"),
            Participant::placeholder(uid("peer")),
            ParticipantSource::Placeholder,
        );
        store.set_participant(
            &tid("t-2"),
            Participant::new(uid("peer"), "Pete", None),
            ParticipantSource::Friend,
        );

        let pending = store.unresolved_participants();
        assert_eq!(pending, vec![(tid("t-1"), vec![me(), uid("peer")])]);
    }

    #[test]
    fn replace_threads_follows_server_order_and_drops_empty_strays() {
        let mut store = store_with(&["t-1", "t-2"]);
        store.replace_threads(vec![summary("t-3"), summary("t-1")]);

        let ids: Vec<&str> = store.threads().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["t-3", "t-1"]);
    }

    #[test]
    fn replace_threads_never_drops_a_thread_with_messages() {
        let mut store = ThreadStore::new();
        store.append_message(&tid("t-9"), inbound("m-1", "t-9", 0), &me());

        store.replace_threads(vec![summary("t-1")]);

        assert_eq!(store.thread(&tid("t-9")).unwrap().messages().len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn upsert_thread_is_idempotent() {
        let mut store = ThreadStore::new();
        assert!(store.upsert_thread(summary("t-1")));
        assert!(!store.upsert_thread(summary("t-1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn echo_is_ignored() {
        let mut store = store_with(&["t-1"]);
        let mut own = inbound("m-1", "t-1", 0);
        own.sender_id = me();

        assert_eq!(store.append_message(&tid("t-1"), own, &me()), AppendOutcome::Echo);
        let thread = store.thread(&tid("t-1")).unwrap();
        assert!(thread.messages().is_empty());
        assert_eq!(thread.unread_count(), 0);
    }

    #[test]
    fn inbound_on_inactive_thread_counts_unread() {
        let mut store = store_with(&["t-1", "t-2"]);
        store.set_active_thread(Some(tid("t-2")));

        let outcome = store.append_message(&tid("t-1"), inbound("m-1", "t-1", 0), &me());
        assert_eq!(
            outcome,
            AppendOutcome::Inserted {
                unread_incremented: true,
                created_thread: false
            }
        );
        assert_eq!(store.thread(&tid("t-1")).unwrap().unread_count(), 1);
        assert_eq!(store.total_unread(), 1);
    }

    #[test]
    fn inbound_on_active_thread_does_not_count_unread() {
        let mut store = store_with(&["t-1"]);
        store.set_active_thread(Some(tid("t-1")));

        store.append_message(&tid("t-1"), inbound("m-1", "t-1", 0), &me());
        assert_eq!(store.thread(&tid("t-1")).unwrap().unread_count(), 0);
    }

    #[test]
    fn inbound_for_unknown_thread_creates_stub() {
        let mut store = ThreadStore::new();
        let outcome = store.append_message(&tid("t-new"), inbound("m-1", "t-new", 0), &me());

        assert_eq!(
            outcome,
            AppendOutcome::Inserted {
                unread_incremented: true,
                created_thread: true
            }
        );
        let thread = store.thread(&tid("t-new")).unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.participant_ids(), &[me(), uid("peer")]);
        assert_eq!(store.unresolved_participants().len(), 1);
    }

    #[test]
    fn clear_unread_zeroes_counter_and_returns_marker() {
        let mut store = store_with(&["t-1"]);
        store.append_message(&tid("t-1"), inbound("m-1", "t-1", 0), &me());
        store.append_message(&tid("t-1"), inbound("m-2", "t-1", 1), &me());

        let marker = store.clear_unread(&tid("t-1")).unwrap();
        assert_eq!(marker, Some(MessageId::server("m-2").unwrap()));
        assert_eq!(store.thread(&tid("t-1")).unwrap().unread_count(), 0);
    }

    #[test]
    fn set_active_thread_does_not_clear_unread() {
        let mut store = store_with(&["t-1"]);
        store.append_message(&tid("t-1"), inbound("m-1", "t-1", 0), &me());

        assert_eq!(store.set_active_thread(Some(tid("t-1"))), None);
        assert_eq!(store.thread(&tid("t-1")).unwrap().unread_count(), 1);
    }

    #[test]
    fn optimistic_send_then_confirm_leaves_no_temporary() {
        let mut store = store_with(&["t-1"]);
        let local = store.push_optimistic(&tid("t-1"), &me(), "hello").unwrap();
        assert_eq!(local.state, DeliveryState::Pending);

        let mut confirmed = inbound("m-1", "t-1", 0);
        confirmed.sender_id = me();
        assert!(store.confirm_send(&tid("t-1"), &local.id, confirmed));

        let thread = store.thread(&tid("t-1")).unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.local_messages().count(), 0);
    }

    #[test]
    fn optimistic_send_to_unknown_thread_fails() {
        let mut store = ThreadStore::new();
        assert_eq!(
            store.push_optimistic(&tid("t-x"), &me(), "hi").unwrap_err(),
            MessagingError::ThreadNotFound(tid("t-x"))
        );
    }

    #[test]
    fn retry_requires_failed_state() {
        let mut store = store_with(&["t-1"]);
        let local = store.push_optimistic(&tid("t-1"), &me(), "hello").unwrap();

        assert_eq!(
            store.begin_retry(&tid("t-1"), &local.id).unwrap_err(),
            MessagingError::NotFailed(local.id.clone())
        );

        assert!(store.fail_send(&tid("t-1"), &local.id));
        assert_eq!(store.begin_retry(&tid("t-1"), &local.id).unwrap(), "hello");
        let state = store.thread(&tid("t-1")).unwrap().message(&local.id).unwrap().state;
        assert_eq!(state, DeliveryState::Pending);
    }

    #[test]
    fn discard_removes_failed_message() {
        let mut store = store_with(&["t-1"]);
        let local = store.push_optimistic(&tid("t-1"), &me(), "oops").unwrap();
        store.fail_send(&tid("t-1"), &local.id);

        let removed = store.discard_failed(&tid("t-1"), &local.id).unwrap();
        assert_eq!(removed.text, "oops");
        assert!(store.thread(&tid("t-1")).unwrap().messages().is_empty());
    }

    #[test]
    fn discard_unknown_message_is_not_found() {
        let mut store = store_with(&["t-1"]);
        let ghost = MessageId::temporary();
        assert!(matches!(
            store.discard_failed(&tid("t-1"), &ghost),
            Err(MessagingError::MessageNotFound { .. })
        ));
    }

    #[test]
    fn stale_reload_does_not_roll_back_pushed_message() {
        let mut store = store_with(&["t-1"]);
        store.replace_messages(&tid("t-1"), vec![inbound("m-1", "t-1", 0)]);
        store.append_message(&tid("t-1"), inbound("m-2", "t-1", 10), &me());

        // Fetch started before m-2 was posted.
        store.replace_messages(&tid("t-1"), vec![inbound("m-1", "t-1", 0)]);

        let ids: Vec<String> = store
            .thread(&tid("t-1"))
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.id.to_string())
            .collect();
        assert_eq!(ids, vec!["m-1", "m-2"]);
    }

    proptest! {
        #[test]
        fn repeated_appends_insert_once(ids in proptest::collection::vec(0u8..5, 1..40)) {
            let mut store = store_with(&["t-1"]);
            for id in &ids {
                store.append_message(&tid("t-1"), inbound(&format!("m-{}", id), "t-1", *id as i64), &me());
            }

            let thread = store.thread(&tid("t-1")).unwrap();
            let mut distinct: Vec<u8> = ids.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(thread.messages().len(), distinct.len());
            for id in distinct {
                let wanted = MessageId::server(format!("m-{}", id)).unwrap();
                prop_assert_eq!(thread.messages().iter().filter(|m| m.id == wanted).count(), 1);
            }
        }

        #[test]
        fn clear_unread_always_zeroes(count in 0usize..20) {
            let mut store = store_with(&["t-1"]);
            for i in 0..count {
                store.append_message(&tid("t-1"), inbound(&format!("m-{}", i), "t-1", i as i64), &me());
            }
            store.clear_unread(&tid("t-1")).unwrap();
            prop_assert_eq!(store.thread(&tid("t-1")).unwrap().unread_count(), 0);
        }
    }
}
