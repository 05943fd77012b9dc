//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the client core to external systems:
//! - `http` - Typed REST clients over a shared `ApiClient`
//! - `websocket` - Real-time transport (tokio-tungstenite, in-memory)
//! - `storage` - Credential stores (YAML file, in-memory)

pub mod http;
pub mod storage;
pub mod websocket;

pub use http::{ApiClient, HttpMessagingApi, UsersClient};
pub use storage::{FileCredentialStore, InMemoryCredentialStore};
pub use websocket::{InMemoryTransport, WebSocketTransport};
