//! Social graph: friends, friend requests and matches.

mod friends;

pub use friends::{FriendRequest, FriendRequestStatus, FriendRequests, Match};
