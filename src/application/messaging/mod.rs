//! Messaging - threads, messages, unread tracking and participant
//! resolution on top of the REST and real-time ports.

mod errors;
mod resolver;
mod service;
mod store;

pub use errors::MessagingError;
pub use resolver::{Contacts, ParticipantCache, ParticipantResolver, ResolvedParticipant};
pub use service::MessagingService;
pub use store::{AppendOutcome, ThreadStore};
