//! Application layer - use cases over the ports.
//!
//! `ClientSession` owns everything that lives between login and logout;
//! `MessagingService` is the action surface of the messaging subsystem.

pub mod messaging;
mod session;

pub use messaging::{
    AppendOutcome, Contacts, MessagingError, MessagingService, ParticipantCache,
    ParticipantResolver, ThreadStore,
};
pub use session::{ClientSession, SessionError};
