//! Registry of inbound message handlers shared by the transports.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::messaging::Message;
use crate::ports::{MessageHandler, SubscriptionId};

/// Ordered set of subscribed handlers.
///
/// Handlers run in subscription order. The registry is snapshotted before
/// dispatch, so a handler may subscribe or unsubscribe others without
/// deadlocking; the change takes effect from the next message.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<BTreeMap<SubscriptionId, Arc<dyn MessageHandler>>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(subscription = %id, handler = handler.name(), "handler subscribed");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handler);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `message` to every handler once.
    pub async fn dispatch(&self, message: Message) {
        let handlers: Vec<Arc<dyn MessageHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for handler in handlers {
            tracing::trace!(handler = handler.name(), message_id = %message.id, "dispatching");
            handler.handle(message.clone()).await;
        }
    }
}
