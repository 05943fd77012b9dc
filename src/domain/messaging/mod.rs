//! Messaging domain: threads, messages and participant identities.

mod message;
mod participant;
mod thread;

pub use message::{DeliveryState, Message};
pub use participant::{other_party, Participant, ParticipantSource, PLACEHOLDER_NAME};
pub use thread::{ReloadOutcome, Thread, ThreadSummary};
