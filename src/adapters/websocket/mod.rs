//! WebSocket adapters for the real-time messaging channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      WebSocketTransport                              │
//! │   connect / join_room / leave_room / on_message / disconnect         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ spawns
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      connection task                                 │
//! │   token per attempt ─ bounded reconnect ─ room replay                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ new_message
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      HandlerRegistry                                 │
//! │   StoreUpdater │ any other subscriber                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Frame protocol types
//! - [`handlers`] - Subscriber registry shared by both transports
//! - [`transport`] - tokio-tungstenite client
//! - [`in_memory`] - Network-free transport for tests

pub mod handlers;
pub mod in_memory;
pub mod messages;
pub mod transport;

pub use handlers::HandlerRegistry;
pub use in_memory::InMemoryTransport;
pub use messages::{ClientFrame, ServerFrame};
pub use transport::WebSocketTransport;
