//! Storage Adapters
//!
//! Implementations of the CredentialStore port.
//!
//! ## Available Adapters
//!
//! - **FileCredentialStore** - Persists the session as YAML on disk
//! - **InMemoryCredentialStore** - Keeps the session in memory (testing)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileCredentialStore, InMemoryCredentialStore};
//!
//! let store = FileCredentialStore::open(".coop-client/session.yaml").await?;
//!
//! let store = InMemoryCredentialStore::new();
//! ```

mod file_credential_store;
mod in_memory_credential_store;

pub use file_credential_store::FileCredentialStore;
pub use in_memory_credential_store::InMemoryCredentialStore;
