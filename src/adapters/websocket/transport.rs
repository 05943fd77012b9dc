//! WebSocket implementation of the `RealtimeTransport` port.
//!
//! # Connection task
//!
//! `connect` spawns one background task that owns the socket:
//!
//! ```text
//! loop {
//!     read token from credential store
//!     connect ──ok──▶ Connected ─▶ re-join rooms ─▶ pump frames until drop
//!        │
//!        └─fail─▶ Reconnecting{n} ─▶ sleep(delay) ─▶ retry (n ≤ max) | Failed
//! }
//! ```
//!
//! Outbound frames go through an unbounded channel that only exists while
//! a socket is up. With no socket the frame is dropped; room membership is
//! remembered separately and replayed on the next connect.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::RealtimeConfig;
use crate::domain::foundation::ThreadId;
use crate::ports::{
    ConnectionHandle, ConnectionState, CredentialStore, MessageHandler, RealtimeTransport,
    SubscriptionId, TransportError,
};

use super::handlers::HandlerRegistry;
use super::messages::{ClientFrame, ServerFrame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the transport and its connection task.
struct Shared {
    config: RealtimeConfig,
    credentials: Arc<dyn CredentialStore>,
    handlers: HandlerRegistry,
    rooms: Mutex<BTreeSet<ThreadId>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<ClientFrame>>>,
    state: watch::Sender<ConnectionState>,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Queues a frame on the live socket. Returns false if there is none.
    fn emit(&self, frame: ClientFrame) -> bool {
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Endpoint with the current access token, re-read on every attempt.
    async fn endpoint(&self) -> Result<reqwest::Url, TransportError> {
        let mut url = reqwest::Url::parse(&self.config.url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        match self.credentials.load().await {
            Ok(Some(session)) => {
                url.query_pairs_mut()
                    .append_pair("token", session.tokens.access_token());
            }
            Ok(None) => tracing::debug!("connecting to real-time channel without a token"),
            Err(e) => tracing::warn!(error = %e, "could not read credentials for real-time auth"),
        }
        Ok(url)
    }

    async fn handle_text(&self, text: &str) {
        let frame = match ServerFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed real-time frame");
                return;
            }
        };

        match frame {
            ServerFrame::NewMessage { message } => match message.into_message() {
                Ok(message) => {
                    tracing::debug!(
                        thread_id = %message.thread_id,
                        message_id = %message.id,
                        "real-time message received"
                    );
                    self.handlers.dispatch(message).await;
                }
                Err(e) => tracing::warn!(error = %e, "dropping invalid real-time message"),
            },
            ServerFrame::Unknown => tracing::debug!("ignoring unknown real-time frame"),
        }
    }

    /// Pumps one live socket. Returns true if shutdown was requested.
    async fn serve(&self, socket: Socket, shutdown: &mut watch::Receiver<bool>) -> bool {
        let (mut sink, mut source) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(tx);

        let rooms: Vec<ThreadId> = lock(&self.rooms).iter().cloned().collect();
        for thread_id in &rooms {
            if let Err(e) = send_frame(&mut sink, &ClientFrame::join(thread_id)).await {
                tracing::warn!(thread_id = %thread_id, error = %e, "failed to re-join room");
            }
        }
        if !rooms.is_empty() {
            tracing::debug!(count = rooms.len(), "re-joined rooms");
        }

        let stopped = loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break true;
                }
                Some(frame) = rx.recv() => {
                    if let Err(e) = send_frame(&mut sink, &frame).await {
                        tracing::warn!(error = %e, "real-time send failed");
                        break false;
                    }
                }
                incoming = source.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => self.handle_text(text.as_str()).await,
                    Some(Ok(WsMessage::Close(_))) | None => break false,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "real-time read failed");
                        break false;
                    }
                },
            }
        };

        *lock(&self.outbound) = None;
        stopped
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame) -> Result<(), TransportError>
where
    S: futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = frame.encode()?;
    sink.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))
}

/// Connection loop run by the background task.
async fn run(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let max_attempts = shared.config.max_reconnect_attempts;
    let delay = shared.config.reconnect_delay();
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            return;
        }

        let url = match shared.endpoint().await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "real-time endpoint is invalid");
                shared.set_state(ConnectionState::Failed);
                return;
            }
        };

        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                attempt = 0;
                shared.set_state(ConnectionState::Connected);
                tracing::info!("real-time channel connected");

                if shared.serve(socket, &mut shutdown).await {
                    return;
                }
                tracing::warn!("real-time channel dropped");
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "real-time connect failed");
            }
        }

        attempt += 1;
        if attempt > max_attempts {
            tracing::error!(
                attempts = max_attempts,
                "real-time reconnect attempts exhausted, continuing REST-only"
            );
            shared.set_state(ConnectionState::Failed);
            return;
        }

        shared.set_state(ConnectionState::Reconnecting { attempt });
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => return,
        }
    }
}

/// WebSocket transport with bounded fixed-delay reconnection.
pub struct WebSocketTransport {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    task: tokio::sync::Mutex<Option<(ConnectionHandle, JoinHandle<()>)>>,
}

impl WebSocketTransport {
    pub fn new(config: RealtimeConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                handlers: HandlerRegistry::new(),
                rooms: Mutex::new(BTreeSet::new()),
                outbound: Mutex::new(None),
                state,
            }),
            shutdown,
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Rooms that will be (re-)joined on connect.
    pub fn rooms(&self) -> Vec<ThreadId> {
        lock(&self.shared.rooms).iter().cloned().collect()
    }
}

#[async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn connect(&self) -> Result<ConnectionHandle, TransportError> {
        let mut task = self.task.lock().await;
        if self.state() == ConnectionState::Closed {
            return Err(TransportError::Closed);
        }
        // A task that gave up (Failed) may be restarted; a live one is reused.
        if let Some((handle, join)) = task.as_ref() {
            if !join.is_finished() {
                return Ok(*handle);
            }
            tracing::info!(connection = %handle, "restarting real-time transport after failure");
        }

        let url = reqwest::Url::parse(&self.shared.config.url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let handle = ConnectionHandle::new();
        self.shared.set_state(ConnectionState::Connecting);
        let join = tokio::spawn(run(self.shared.clone(), self.shutdown.subscribe()));
        *task = Some((handle, join));

        tracing::debug!(connection = %handle, "real-time transport started");
        Ok(handle)
    }

    fn join_room(&self, thread_id: &ThreadId) {
        lock(&self.shared.rooms).insert(thread_id.clone());
        if !self.shared.emit(ClientFrame::join(thread_id)) {
            tracing::debug!(thread_id = %thread_id, "not connected, join deferred to reconnect");
        }
    }

    fn leave_room(&self, thread_id: &ThreadId) {
        lock(&self.shared.rooms).remove(thread_id);
        if !self.shared.emit(ClientFrame::leave(thread_id)) {
            tracing::debug!(thread_id = %thread_id, "not connected, leave frame dropped");
        }
    }

    fn on_message(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId {
        self.shared.handlers.subscribe(handler)
    }

    fn off_message(&self, subscription: SubscriptionId) -> bool {
        self.shared.handlers.unsubscribe(subscription)
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    async fn disconnect(&self) {
        self.shutdown.send_replace(true);
        let task = self.task.lock().await.take();
        if let Some((handle, join)) = task {
            if let Err(e) = join.await {
                tracing::warn!(connection = %handle, error = %e, "real-time task ended abnormally");
            }
        }
        self.shared.set_state(ConnectionState::Closed);
        tracing::debug!("real-time transport closed");
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}
