//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the client core and the outside world. Adapters implement these ports.
//!
//! ## REST Ports
//!
//! - `MessagingApi` - Threads and messages
//! - `UserDirectory` - User lookup by id
//!
//! ## Real-time Ports
//!
//! - `RealtimeTransport` - Push channel with room scoping
//! - `MessageHandler` - Callback for inbound messages
//!
//! ## Session Ports
//!
//! - `CredentialStore` - Tokens and cached user, observable

mod api_error;
mod credential_store;
mod messaging_api;
mod realtime_transport;
mod user_directory;

pub use api_error::ApiError;
pub use credential_store::{CredentialStore, CredentialStoreError};
pub use messaging_api::MessagingApi;
pub use realtime_transport::{
    ConnectionHandle, ConnectionState, MessageHandler, RealtimeTransport, SubscriptionId,
    TransportError,
};
pub use user_directory::UserDirectory;
