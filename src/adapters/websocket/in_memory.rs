//! In-memory real-time transport.
//!
//! Records every frame the client would have sent and lets tests push
//! inbound messages and force state changes. Sessions with real-time
//! disabled also use it as an inert transport.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::foundation::ThreadId;
use crate::domain::messaging::Message;
use crate::ports::{
    ConnectionHandle, ConnectionState, MessageHandler, RealtimeTransport, SubscriptionId,
    TransportError,
};

use super::handlers::HandlerRegistry;
use super::messages::ClientFrame;

/// Transport that never touches the network.
pub struct InMemoryTransport {
    handlers: HandlerRegistry,
    handle: Mutex<Option<ConnectionHandle>>,
    rooms: Mutex<BTreeSet<ThreadId>>,
    sent: Mutex<Vec<ClientFrame>>,
    connect_calls: Mutex<usize>,
    state: watch::Sender<ConnectionState>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            handlers: HandlerRegistry::new(),
            handle: Mutex::new(None),
            rooms: Mutex::new(BTreeSet::new()),
            sent: Mutex::new(Vec::new()),
            connect_calls: Mutex::new(0),
            state,
        }
    }

    // === Test Helpers ===

    /// Delivers `message` to every subscribed handler, as if pushed by the
    /// server. Dropped unless connected.
    pub async fn push(&self, message: Message) -> bool {
        if !self.state().is_connected() {
            return false;
        }
        self.handlers.dispatch(message).await;
        true
    }

    /// Forces a connection state, e.g. to simulate a drop.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Frames sent while connected, in order.
    pub fn sent_frames(&self) -> Vec<ClientFrame> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rooms currently joined.
    pub fn joined_rooms(&self) -> Vec<ThreadId> {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Number of `connect` calls made.
    pub fn connect_calls(&self) -> usize {
        *self
            .connect_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn emit(&self, frame: ClientFrame) {
        if self.state().is_connected() {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(frame);
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for InMemoryTransport {
    async fn connect(&self) -> Result<ConnectionHandle, TransportError> {
        *self
            .connect_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;

        if self.state() == ConnectionState::Closed {
            return Err(TransportError::Closed);
        }

        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let handle = *handle.get_or_insert_with(ConnectionHandle::new);
        self.set_state(ConnectionState::Connected);
        Ok(handle)
    }

    fn join_room(&self, thread_id: &ThreadId) {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(thread_id.clone());
        self.emit(ClientFrame::join(thread_id));
    }

    fn leave_room(&self, thread_id: &ThreadId) {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(thread_id);
        self.emit(ClientFrame::leave(thread_id));
    }

    fn on_message(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId {
        self.handlers.subscribe(handler)
    }

    fn off_message(&self, subscription: SubscriptionId) -> bool {
        self.handlers.unsubscribe(subscription)
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn disconnect(&self) {
        self.set_state(ConnectionState::Closed);
    }
}
