//! Domain layer containing client-side business types and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors)
//! - `messaging` - Threads, messages, participant identities
//! - `user` - Profiles and authentication material
//! - `social` - Friends, friend requests, matches
//! - `community` - Events, news, tags
//! - `assessment` - Question trees, scoring, tag aggregation

pub mod assessment;
pub mod community;
pub mod foundation;
pub mod messaging;
pub mod social;
pub mod user;
