//! coop-client - Client SDK for the Useless Men's Co-Operative
//!
//! A typed REST client, a real-time WebSocket transport and the messaging
//! subsystem (threads, optimistic sends, unread tracking, participant
//! resolution) built on top of them.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
