//! MessagingService - the action surface of the messaging subsystem.
//!
//! Composes the REST port, the real-time transport, the thread store and
//! the participant resolver into user actions.
//!
//! ## Flows
//!
//! ```text
//! action --> MessagingService --(REST)--> ThreadStore
//! push   --> StoreUpdater ---------------> ThreadStore
//! ```
//!
//! The two flows are not serialized against each other. The store lock and
//! the participant cache lock are taken only for synchronous reads and
//! mutations, never across a network await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock as StdRwLock};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;

use crate::domain::foundation::{MessageId, ThreadId, UserId};
use crate::domain::messaging::{other_party, Message, ReloadOutcome, Thread};
use crate::ports::{
    ConnectionState, MessageHandler, MessagingApi, RealtimeTransport, SubscriptionId,
    UserDirectory,
};

use super::errors::MessagingError;
use super::resolver::{Contacts, ParticipantCache, ParticipantResolver};
use super::store::{AppendOutcome, ThreadStore};

/// State shared between the service and its push handler.
struct Shared {
    store: RwLock<ThreadStore>,
    resolver: ParticipantResolver,
    participants: Mutex<ParticipantCache>,
    contacts: StdRwLock<Contacts>,
    current_user: UserId,
}

impl Shared {
    fn contacts(&self) -> Contacts {
        self.contacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn participants(&self) -> MutexGuard<'_, ParticipantCache> {
        self.participants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn append(&self, message: Message) -> AppendOutcome {
        let thread_id = message.thread_id.clone();
        let outcome = self
            .store
            .write()
            .await
            .append_message(&thread_id, message, &self.current_user);

        match outcome {
            AppendOutcome::Echo => {
                tracing::debug!(thread_id = %thread_id, "ignoring own echo");
            }
            AppendOutcome::Duplicate => {
                tracing::debug!(thread_id = %thread_id, "ignoring duplicate message");
            }
            AppendOutcome::Inserted { unread_incremented, .. } => {
                tracing::debug!(thread_id = %thread_id, unread_incremented, "message appended");
            }
        }
        outcome
    }

    /// Resolves every thread whose other party is unknown or a placeholder.
    ///
    /// Cache hits are applied at once. Misses are looked up once per user,
    /// concurrently, and each result lands in the store as soon as it
    /// arrives.
    async fn resolve_pending(&self) {
        let pending = self.store.read().await.unresolved_participants();
        if pending.is_empty() {
            return;
        }

        let mut hits = Vec::new();
        let mut misses: HashMap<UserId, (Vec<UserId>, Vec<ThreadId>)> = HashMap::new();
        {
            let cache = self.participants();
            for (thread_id, participant_ids) in pending {
                let Some(other) = other_party(&participant_ids, &self.current_user).cloned() else {
                    continue;
                };
                match cache.cached(&participant_ids, &self.current_user) {
                    Some(resolved) => hits.push((thread_id, resolved)),
                    None => misses
                        .entry(other)
                        .or_insert_with(|| (participant_ids, Vec::new()))
                        .1
                        .push(thread_id),
                }
            }
        }

        if !hits.is_empty() {
            let mut store = self.store.write().await;
            for (thread_id, resolved) in hits {
                store.set_participant(&thread_id, resolved.participant, resolved.source);
            }
        }

        let contacts = self.contacts();
        let contacts = &contacts;
        let lookups = misses.into_values().map(move |(participant_ids, thread_ids)| async move {
            let Some(resolved) = self
                .resolver
                .resolve(&participant_ids, &self.current_user, contacts)
                .await
            else {
                return;
            };
            self.participants().remember(&resolved);

            let mut store = self.store.write().await;
            for thread_id in &thread_ids {
                store.set_participant(thread_id, resolved.participant.clone(), resolved.source);
            }
        });
        join_all(lookups).await;
    }
}

/// Push handler that feeds inbound messages into the store.
struct StoreUpdater {
    shared: Arc<Shared>,
}

#[async_trait]
impl MessageHandler for StoreUpdater {
    async fn handle(&self, message: Message) {
        let outcome = self.shared.append(message).await;
        if let AppendOutcome::Inserted {
            created_thread: true,
            ..
        } = outcome
        {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.resolve_pending().await });
        }
    }

    fn name(&self) -> &'static str {
        "store_updater"
    }
}

/// User-facing messaging actions for one signed-in user.
pub struct MessagingService {
    api: Arc<dyn MessagingApi>,
    transport: Arc<dyn RealtimeTransport>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl MessagingService {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        transport: Arc<dyn RealtimeTransport>,
        directory: Arc<dyn UserDirectory>,
        current_user: UserId,
    ) -> Self {
        Self {
            api,
            transport,
            shared: Arc::new(Shared {
                store: RwLock::new(ThreadStore::new()),
                resolver: ParticipantResolver::new(directory),
                participants: Mutex::new(ParticipantCache::new()),
                contacts: StdRwLock::new(Contacts::default()),
                current_user,
            }),
            subscription: Mutex::new(None),
        }
    }

    pub fn current_user(&self) -> &UserId {
        &self.shared.current_user
    }

    pub fn transport(&self) -> &Arc<dyn RealtimeTransport> {
        &self.transport
    }

    // ════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════

    /// Subscribes to pushes and opens the real-time connection.
    ///
    /// A connection failure is logged and the service keeps working
    /// REST-only.
    pub async fn start(&self) -> ConnectionState {
        {
            let mut subscription = self
                .subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if subscription.is_none() {
                let handler = Arc::new(StoreUpdater {
                    shared: Arc::clone(&self.shared),
                });
                *subscription = Some(self.transport.on_message(handler));
            }
        }

        match self.transport.connect().await {
            Ok(handle) => {
                tracing::debug!(connection = %handle, "real-time transport started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "real-time unavailable, continuing REST-only");
            }
        }
        self.transport.state()
    }

    /// Unsubscribes and closes the real-time connection.
    pub async fn stop(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = subscription {
            self.transport.off_message(id);
        }
        self.transport.disconnect().await;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Replaces the friends and matches used for participant resolution.
    pub fn set_contacts(&self, contacts: Contacts) {
        *self
            .shared
            .contacts
            .write()
            .unwrap_or_else(PoisonError::into_inner) = contacts;
    }

    /// Retries resolution for threads still unknown or shown as a
    /// placeholder, e.g. after new contacts arrive.
    pub async fn resolve_participants(&self) {
        self.shared.resolve_pending().await;
    }

    // ════════════════════════════════════════════════════════════════════════
    // Threads
    // ════════════════════════════════════════════════════════════════════════

    /// Reloads the thread list, then resolves unknown participants.
    pub async fn fetch_threads(&self) -> Result<(), MessagingError> {
        let summaries = self.api.list_threads().await?;
        let count = summaries.len();
        self.shared.store.write().await.replace_threads(summaries);
        tracing::debug!(count, "thread list refreshed");

        self.shared.resolve_pending().await;
        Ok(())
    }

    /// Reloads one thread's messages.
    pub async fn fetch_messages(&self, thread_id: &ThreadId) -> Result<ReloadOutcome, MessagingError> {
        let messages = self.api.fetch_messages(thread_id).await?;
        let outcome = self
            .shared
            .store
            .write()
            .await
            .replace_messages(thread_id, messages);
        tracing::debug!(
            thread_id = %thread_id,
            fetched = outcome.fetched,
            kept_newer = outcome.kept_newer,
            kept_local = outcome.kept_local,
            settled_local = outcome.settled_local,
            "messages reloaded"
        );
        Ok(outcome)
    }

    /// Returns the thread with `peer_id`, creating it on the server if needed.
    pub async fn start_thread(&self, peer_id: &UserId) -> Result<ThreadId, MessagingError> {
        let summary = self.api.start_thread(peer_id).await?;
        let thread_id = summary.id.clone();
        let created = self.shared.store.write().await.upsert_thread(summary);
        tracing::debug!(thread_id = %thread_id, created, "thread started");

        self.shared.resolve_pending().await;
        Ok(thread_id)
    }

    /// Focuses a thread: moves the room subscription, loads its messages
    /// and marks it read.
    pub async fn open_thread(&self, thread_id: &ThreadId) -> Result<(), MessagingError> {
        let previous = self.set_active_thread(Some(thread_id.clone())).await;
        if let Some(previous) = previous.filter(|p| p != thread_id) {
            self.transport.leave_room(&previous);
        }
        self.transport.join_room(thread_id);

        self.fetch_messages(thread_id).await?;
        self.mark_thread_read(thread_id, None).await?;
        self.shared.resolve_pending().await;
        Ok(())
    }

    /// Drops focus and leaves the active thread's room.
    pub async fn close_thread(&self) {
        if let Some(previous) = self.set_active_thread(None).await {
            self.transport.leave_room(&previous);
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Messages
    // ════════════════════════════════════════════════════════════════════════

    /// Sends `text` optimistically.
    ///
    /// The message appears at once as pending. On success it is replaced in
    /// place by the server's copy; on failure it stays as failed and the
    /// error is returned.
    pub async fn send_message(
        &self,
        thread_id: &ThreadId,
        text: &str,
    ) -> Result<Message, MessagingError> {
        if text.trim().is_empty() {
            return Err(MessagingError::EmptyText);
        }

        let local = self.shared.store.write().await.push_optimistic(
            thread_id,
            &self.shared.current_user,
            text,
        )?;
        self.deliver(thread_id, &local.id, text).await
    }

    /// Resends a failed message.
    pub async fn retry_failed(
        &self,
        thread_id: &ThreadId,
        local_id: &MessageId,
    ) -> Result<Message, MessagingError> {
        let text = self
            .shared
            .store
            .write()
            .await
            .begin_retry(thread_id, local_id)?;
        self.deliver(thread_id, local_id, &text).await
    }

    /// Removes a failed message without resending it.
    pub async fn discard_failed(
        &self,
        thread_id: &ThreadId,
        local_id: &MessageId,
    ) -> Result<Message, MessagingError> {
        self.shared
            .store
            .write()
            .await
            .discard_failed(thread_id, local_id)
    }

    /// Applies an inbound message, as the push handler does.
    pub async fn append_message(&self, message: Message) -> AppendOutcome {
        self.shared.append(message).await
    }

    /// Zeroes the unread counter locally, then tells the server.
    ///
    /// Without an explicit `last_seen`, the newest confirmed message is
    /// reported.
    pub async fn mark_thread_read(
        &self,
        thread_id: &ThreadId,
        last_seen: Option<MessageId>,
    ) -> Result<(), MessagingError> {
        let newest = self.shared.store.write().await.clear_unread(thread_id)?;
        let last_seen = last_seen.or(newest);

        self.api
            .mark_read(thread_id, last_seen.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(thread_id = %thread_id, error = %e, "mark read failed");
                MessagingError::from(e)
            })
    }

    /// Switches focus without clearing unread. Returns the previous focus.
    pub async fn set_active_thread(&self, thread_id: Option<ThreadId>) -> Option<ThreadId> {
        self.shared.store.write().await.set_active_thread(thread_id)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Snapshots
    // ════════════════════════════════════════════════════════════════════════

    /// Threads in display order.
    pub async fn threads(&self) -> Vec<Thread> {
        self.shared.store.read().await.threads().cloned().collect()
    }

    pub async fn thread(&self, thread_id: &ThreadId) -> Option<Thread> {
        self.shared.store.read().await.thread(thread_id).cloned()
    }

    pub async fn active_thread(&self) -> Option<ThreadId> {
        self.shared.store.read().await.active_thread().cloned()
    }

    pub async fn total_unread(&self) -> u32 {
        self.shared.store.read().await.total_unread()
    }

    async fn deliver(
        &self,
        thread_id: &ThreadId,
        local_id: &MessageId,
        text: &str,
    ) -> Result<Message, MessagingError> {
        match self.api.send_message(thread_id, text).await {
            Ok(confirmed) => {
                self.shared
                    .store
                    .write()
                    .await
                    .confirm_send(thread_id, local_id, confirmed.clone());
                tracing::debug!(thread_id = %thread_id, message_id = %confirmed.id, "message sent");
                Ok(confirmed)
            }
            Err(e) => {
                self.shared.store.write().await.fail_send(thread_id, local_id);
                tracing::warn!(thread_id = %thread_id, error = %e, "send failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::{ClientFrame, InMemoryTransport};
    use crate::domain::foundation::Timestamp;
    use crate::domain::messaging::{DeliveryState, ParticipantSource, ThreadSummary, PLACEHOLDER_NAME};
    use crate::domain::user::UserProfile;
    use crate::ports::ApiError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    // ════════════════════════════════════════════════════════════════════════
    // Mocks
    // ════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct MockMessagingApi {
        threads: Mutex<Vec<ThreadSummary>>,
        messages: Mutex<HashMap<ThreadId, Vec<Message>>>,
        mark_read_calls: Mutex<Vec<(ThreadId, Option<MessageId>)>>,
        fail_sends: AtomicBool,
        fail_mark_read: AtomicBool,
        next_id: AtomicU32,
    }

    impl MockMessagingApi {
        fn with_threads(threads: Vec<ThreadSummary>) -> Self {
            Self {
                threads: Mutex::new(threads),
                ..Default::default()
            }
        }

        fn set_messages(&self, thread_id: &ThreadId, messages: Vec<Message>) {
            self.messages
                .lock()
                .unwrap()
                .insert(thread_id.clone(), messages);
        }

        fn mark_read_calls(&self) -> Vec<(ThreadId, Option<MessageId>)> {
            self.mark_read_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingApi for MockMessagingApi {
        async fn list_threads(&self) -> Result<Vec<ThreadSummary>, ApiError> {
            Ok(self.threads.lock().unwrap().clone())
        }

        async fn start_thread(&self, peer_id: &UserId) -> Result<ThreadSummary, ApiError> {
            let mut threads = self.threads.lock().unwrap();
            if let Some(existing) = threads.iter().find(|t| t.participant_ids.contains(peer_id)) {
                return Ok(existing.clone());
            }
            let summary = ThreadSummary::new(
                ThreadId::new(format!("t-{}", peer_id)).unwrap(),
                vec![me(), peer_id.clone()],
            );
            threads.push(summary.clone());
            Ok(summary)
        }

        async fn fetch_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, ApiError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .get(thread_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn send_message(&self, thread_id: &ThreadId, text: &str) -> Result<Message, ApiError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(ApiError::Network("connection reset".to_string()));
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(Message::confirmed(
                MessageId::server(format!("srv-{}", n)).unwrap(),
                thread_id.clone(),
                me(),
                text,
                Timestamp::now(),
            ))
        }

        async fn mark_read(
            &self,
            thread_id: &ThreadId,
            last_seen: Option<&MessageId>,
        ) -> Result<(), ApiError> {
            self.mark_read_calls
                .lock()
                .unwrap()
                .push((thread_id.clone(), last_seen.cloned()));
            if self.fail_mark_read.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    struct MockDirectory {
        users: Vec<UserProfile>,
    }

    #[async_trait]
    impl UserDirectory for MockDirectory {
        async fn fetch_user(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
            self.users
                .iter()
                .find(|u| &u.id == user_id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: 404,
                    body: String::new(),
                })
        }
    }

    /// Directory whose lookups for `slow` wait until the gate opens.
    struct GatedDirectory {
        gate: Semaphore,
        waiting: AtomicU32,
    }

    impl GatedDirectory {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                waiting: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl UserDirectory for GatedDirectory {
        async fn fetch_user(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
            if user_id.as_str() == "slow" {
                self.waiting.fetch_add(1, Ordering::SeqCst);
                let _permit = self.gate.acquire().await.unwrap();
            }
            Ok(profile(user_id.as_str(), &format!("User {}", user_id.as_str())))
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn tid(s: &str) -> ThreadId {
        ThreadId::new(s).unwrap()
    }

    fn me() -> UserId {
        uid("me")
    }

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: uid(id),
            username: id.to_string(),
            display_name: Some(name.to_string()),
            email: None,
            avatar_url: None,
            bio: None,
            is_admin: false,
        }
    }

    fn inbound(id: &str, thread: &str, sender: &str) -> Message {
        Message::confirmed(
            MessageId::server(id).unwrap(),
            tid(thread),
            uid(sender),
            format!("msg {}", id),
            Timestamp::now(),
        )
    }

    fn summary(id: &str, peer: &str) -> ThreadSummary {
        ThreadSummary::new(tid(id), vec![me(), uid(peer)])
    }

    struct Fixture {
        api: Arc<MockMessagingApi>,
        transport: Arc<InMemoryTransport>,
        service: MessagingService,
    }

    fn fixture(threads: Vec<ThreadSummary>) -> Fixture {
        let api = Arc::new(MockMessagingApi::with_threads(threads));
        let transport = Arc::new(InMemoryTransport::new());
        let directory = Arc::new(MockDirectory {
            users: vec![profile("peer", "Pete"), profile("sam", "Sam")],
        });
        let service = MessagingService::new(api.clone(), transport.clone(), directory, me());
        Fixture {
            api,
            transport,
            service,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn start_subscribes_once_and_connects() {
        let f = fixture(vec![]);

        assert_eq!(f.service.start().await, ConnectionState::Connected);
        f.service.start().await;

        assert_eq!(f.transport.handler_count(), 1);
        assert_eq!(f.transport.connect_calls(), 2);
    }

    #[tokio::test]
    async fn stop_unsubscribes_and_closes() {
        let f = fixture(vec![]);
        f.service.start().await;
        f.service.stop().await;

        assert_eq!(f.transport.handler_count(), 0);
        assert_eq!(f.service.connection_state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn fetch_threads_resolves_participants() {
        let f = fixture(vec![summary("t-1", "peer"), summary("t-2", "ghost")]);
        f.service.set_contacts(Contacts::new(vec![profile("peer", "Friend Pete")], vec![]));

        f.service.fetch_threads().await.unwrap();

        let threads = f.service.threads().await;
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].participant().unwrap().display_name, "Friend Pete");
        assert_eq!(threads[1].participant().unwrap().display_name, PLACEHOLDER_NAME);
    }

    #[tokio::test]
    async fn placeholder_is_replaced_once_contacts_load() {
        let f = fixture(vec![summary("t-2", "ghost")]);
        f.service.fetch_threads().await.unwrap();
        let thread = f.service.thread(&tid("t-2")).await.unwrap();
        assert_eq!(thread.participant().unwrap().display_name, PLACEHOLDER_NAME);

        f.service.set_contacts(Contacts::new(vec![profile("ghost", "Gus")], vec![]));
        f.service.fetch_threads().await.unwrap();

        let thread = f.service.thread(&tid("t-2")).await.unwrap();
        assert_eq!(thread.participant().unwrap().display_name, "Gus");
        assert_eq!(thread.participant_source(), Some(ParticipantSource::Friend));
    }

    #[tokio::test]
    async fn resolve_participants_retries_placeholders_without_refetch() {
        let f = fixture(vec![summary("t-2", "ghost")]);
        f.service.fetch_threads().await.unwrap();

        f.service.set_contacts(Contacts::new(vec![profile("ghost", "Gus")], vec![]));
        f.service.resolve_participants().await;

        let thread = f.service.thread(&tid("t-2")).await.unwrap();
        assert_eq!(thread.participant().unwrap().display_name, "Gus");
    }

    #[tokio::test]
    async fn slow_lookup_does_not_hold_up_other_resolutions() {
        let api = Arc::new(MockMessagingApi::with_threads(vec![summary("t-1", "slow")]));
        let directory = Arc::new(GatedDirectory::new());
        let service = Arc::new(MessagingService::new(
            api,
            Arc::new(InMemoryTransport::new()),
            directory.clone(),
            me(),
        ));

        let listing = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.fetch_threads().await })
        };
        tokio::time::timeout(Duration::from_secs(1), async {
            while directory.waiting.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let starting = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.start_thread(&uid("sam")).await })
        };
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let name = service
                    .thread(&tid("t-sam"))
                    .await
                    .and_then(|t| t.participant().map(|p| p.display_name.clone()));
                if name.as_deref() == Some("User sam") {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("sam resolved while the slow lookup was still pending");

        directory.gate.add_permits(8);
        listing.await.unwrap().unwrap();
        starting.await.unwrap().unwrap();

        let slow = service.thread(&tid("t-1")).await.unwrap();
        assert_eq!(slow.participant().unwrap().display_name, "User slow");
    }

    #[tokio::test]
    async fn fetch_threads_never_empties_loaded_thread() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.service
            .append_message(inbound("m-1", "t-1", "peer"))
            .await;

        f.service.fetch_threads().await.unwrap();

        let thread = f.service.thread(&tid("t-1")).await.unwrap();
        assert_eq!(thread.messages().len(), 1);
    }

    #[tokio::test]
    async fn start_thread_twice_yields_one_entry() {
        let f = fixture(vec![]);

        let first = f.service.start_thread(&uid("sam")).await.unwrap();
        let second = f.service.start_thread(&uid("sam")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.service.threads().await.len(), 1);
        let thread = f.service.thread(&first).await.unwrap();
        assert_eq!(thread.participant().unwrap().display_name, "Sam");
    }

    #[tokio::test]
    async fn successful_send_leaves_no_temporary() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();

        let sent = f.service.send_message(&tid("t-1"), "hello").await.unwrap();

        let thread = f.service.thread(&tid("t-1")).await.unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.messages()[0].id, sent.id);
        assert!(thread.messages().iter().all(|m| !m.id.is_temporary()));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_state_change() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();

        let result = f.service.send_message(&tid("t-1"), "   ").await;

        assert_eq!(result, Err(MessagingError::EmptyText));
        assert!(f.service.thread(&tid("t-1")).await.unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn failed_send_is_kept_as_failed_then_retried() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.api.fail_sends.store(true, Ordering::SeqCst);

        let result = f.service.send_message(&tid("t-1"), "hello").await;
        assert!(matches!(result, Err(MessagingError::Api(ApiError::Network(_)))));

        let thread = f.service.thread(&tid("t-1")).await.unwrap();
        let failed = thread.messages()[0].clone();
        assert_eq!(failed.state, DeliveryState::Failed);

        f.api.fail_sends.store(false, Ordering::SeqCst);
        let confirmed = f.service.retry_failed(&tid("t-1"), &failed.id).await.unwrap();

        let thread = f.service.thread(&tid("t-1")).await.unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.messages()[0].id, confirmed.id);
        assert_eq!(thread.messages()[0].state, DeliveryState::Confirmed);
    }

    #[tokio::test]
    async fn failed_send_can_be_discarded() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.api.fail_sends.store(true, Ordering::SeqCst);
        let _ = f.service.send_message(&tid("t-1"), "hello").await;

        let local_id = f.service.thread(&tid("t-1")).await.unwrap().messages()[0]
            .id
            .clone();
        f.service.discard_failed(&tid("t-1"), &local_id).await.unwrap();

        assert!(f.service.thread(&tid("t-1")).await.unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn pushed_messages_flow_into_store() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.service.start().await;

        assert!(f.transport.push(inbound("m-1", "t-1", "peer")).await);
        assert!(f.transport.push(inbound("m-1", "t-1", "peer")).await);
        assert!(f.transport.push(inbound("m-2", "t-1", "me")).await);

        let thread = f.service.thread(&tid("t-1")).await.unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.unread_count(), 1);
        assert_eq!(f.service.total_unread().await, 1);
    }

    #[tokio::test]
    async fn open_thread_moves_room_and_marks_read() {
        let f = fixture(vec![summary("t-1", "peer"), summary("t-2", "sam")]);
        f.api.set_messages(&tid("t-2"), vec![inbound("m-9", "t-2", "sam")]);
        f.service.start().await;
        f.service.fetch_threads().await.unwrap();
        f.service.append_message(inbound("m-1", "t-2", "sam")).await;

        f.service.open_thread(&tid("t-1")).await.unwrap();
        f.service.open_thread(&tid("t-2")).await.unwrap();

        assert_eq!(
            f.transport.sent_frames(),
            vec![
                ClientFrame::join(&tid("t-1")),
                ClientFrame::leave(&tid("t-1")),
                ClientFrame::join(&tid("t-2")),
            ]
        );
        assert_eq!(f.transport.joined_rooms(), vec![tid("t-2")]);
        assert_eq!(f.service.active_thread().await, Some(tid("t-2")));

        let thread = f.service.thread(&tid("t-2")).await.unwrap();
        assert_eq!(thread.unread_count(), 0);
        let calls = f.api.mark_read_calls();
        assert_eq!(calls.last().unwrap().0, tid("t-2"));
        assert!(calls.last().unwrap().1.is_some());
    }

    #[tokio::test]
    async fn mark_read_zeroes_locally_even_if_server_fails() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.service.append_message(inbound("m-1", "t-1", "peer")).await;
        f.service.append_message(inbound("m-2", "t-1", "peer")).await;
        f.api.fail_mark_read.store(true, Ordering::SeqCst);

        let result = f.service.mark_thread_read(&tid("t-1"), None).await;

        assert!(result.is_err());
        assert_eq!(f.service.thread(&tid("t-1")).await.unwrap().unread_count(), 0);
        assert_eq!(
            f.api.mark_read_calls(),
            vec![(tid("t-1"), Some(MessageId::server("m-2").unwrap()))]
        );
    }

    #[tokio::test]
    async fn active_thread_does_not_count_unread() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.fetch_threads().await.unwrap();
        f.service.set_active_thread(Some(tid("t-1"))).await;

        f.service.append_message(inbound("m-1", "t-1", "peer")).await;

        assert_eq!(f.service.total_unread().await, 0);
    }

    #[tokio::test]
    async fn close_thread_leaves_room() {
        let f = fixture(vec![summary("t-1", "peer")]);
        f.service.start().await;
        f.service.fetch_threads().await.unwrap();
        f.service.open_thread(&tid("t-1")).await.unwrap();

        f.service.close_thread().await;

        assert!(f.transport.joined_rooms().is_empty());
        assert_eq!(f.service.active_thread().await, None);
    }

    #[tokio::test]
    async fn push_for_unknown_thread_creates_resolvable_entry() {
        let f = fixture(vec![]);
        f.service.start().await;

        f.transport.push(inbound("m-1", "t-new", "peer")).await;
        f.service.fetch_threads().await.unwrap();

        let thread = f.service.thread(&tid("t-new")).await.unwrap();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.participant().unwrap().display_name, "Pete");
    }
}
