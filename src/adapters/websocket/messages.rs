//! WebSocket frame types for the real-time messaging channel.
//!
//! Frames are JSON text objects tagged by `type`:
//! - Client → Server: `join_room`, `leave_room`
//! - Server → Client: `new_message`
//!
//! Unknown server frame types decode to [`ServerFrame::Unknown`] and are
//! ignored by the transport.

use serde::{Deserialize, Serialize};

use crate::adapters::http::dto::MessageDto;
use crate::domain::foundation::ThreadId;
use crate::ports::TransportError;

// ============================================
// Client → Server Frames
// ============================================

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Scope pushes for a thread to this connection.
    JoinRoom {
        #[serde(rename = "threadId")]
        thread_id: String,
    },

    /// Stop receiving pushes for a thread.
    LeaveRoom {
        #[serde(rename = "threadId")]
        thread_id: String,
    },
}

impl ClientFrame {
    pub fn join(thread_id: &ThreadId) -> Self {
        ClientFrame::JoinRoom {
            thread_id: thread_id.to_string(),
        }
    }

    pub fn leave(thread_id: &ThreadId) -> Self {
        ClientFrame::LeaveRoom {
            thread_id: thread_id.to_string(),
        }
    }

    /// Encodes the frame as JSON text.
    pub fn encode(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Protocol(e.to_string()))
    }
}

// ============================================
// Server → Client Frames
// ============================================

/// Frames the server pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A message was posted to a thread this client can see.
    NewMessage { message: MessageDto },

    /// Any frame type this client does not handle.
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Decodes a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(|e| TransportError::Protocol(e.to_string()))
    }
}
