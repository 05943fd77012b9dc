//! Real-time transport port - the push channel for new messages.
//!
//! ## Contract
//!
//! - `connect` starts at most one underlying connection per transport;
//!   later calls return the same handle.
//! - `join_room` / `leave_room` are best-effort and never wait for an
//!   acknowledgement. Joined rooms survive reconnects.
//! - Every registered handler sees each inbound message at most once.
//! - Nothing is queued while disconnected.
//!
//! ## States
//!
//! ```text
//! Idle --connect--> Connecting --> Connected
//! Connected --drop--> Reconnecting{1..=max} --> Connected | Failed
//! any --disconnect--> Closed
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::foundation::ThreadId;
use crate::domain::messaging::Message;

/// Errors from the real-time transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid real-time URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport has been closed")]
    Closed,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Lifecycle of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `connect` has not been called.
    Idle,
    /// First connection attempt in progress.
    Connecting,
    Connected,
    /// Connection dropped; retrying.
    Reconnecting { attempt: u32 },
    /// Retries exhausted; the client runs REST-only.
    Failed,
    /// Shut down by `disconnect`.
    Closed,
}

impl ConnectionState {
    /// True while pushes can arrive.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True once the transport will not reconnect on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Failed | ConnectionState::Closed)
    }
}

/// Identity of the single connection a transport owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(Uuid);

impl ConnectionHandle {
    /// Creates a new random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token returned by `on_message`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receives inbound messages pushed over the real-time channel.
///
/// Implementations should be:
/// - **Idempotent** - the same message may also arrive through a REST fetch
/// - **Quick** - the transport awaits each handler before the next event
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one inbound message.
    async fn handle(&self, message: Message);

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the real-time push channel.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Starts the connection, or returns the handle of the running one.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if the configured endpoint cannot be used
    /// - `Closed` after `disconnect`
    async fn connect(&self) -> Result<ConnectionHandle, TransportError>;

    /// Asks the server to scope pushes for `thread_id` to this client.
    fn join_room(&self, thread_id: &ThreadId);

    /// Leaves the room for `thread_id`.
    fn leave_room(&self, thread_id: &ThreadId);

    /// Registers a handler for inbound messages.
    fn on_message(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId;

    /// Removes a handler. Returns false if it was not registered.
    fn off_message(&self, subscription: SubscriptionId) -> bool;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Receiver that yields every state change.
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;

    /// Stops the connection for good.
    async fn disconnect(&self);
}
