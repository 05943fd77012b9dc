//! HTTP adapters - typed REST clients for the co-op API.
//!
//! All clients share one [`ApiClient`], which owns bearer attachment and
//! the one-shot token refresh. Each endpoint family gets a thin typed
//! client over it.

mod admin;
mod assessment;
mod auth;
mod client;
pub mod dto;
mod events;
mod friends;
mod messaging;
mod news;
mod tags;
mod users;

pub use admin::AdminQuestionsClient;
pub use assessment::AssessmentClient;
pub use auth::AuthClient;
pub use client::{ApiClient, FilePart, RequestBody};
pub use events::EventsClient;
pub use friends::FriendsClient;
pub use messaging::HttpMessagingApi;
pub use news::NewsClient;
pub use tags::TagsClient;
pub use users::UsersClient;
