//! User accounts and the authentication material the client holds.

mod profile;
mod session;

pub use profile::{ProfileUpdate, UserProfile};
pub use session::{AuthTokens, LoginCredentials, Registration, StoredSession};
