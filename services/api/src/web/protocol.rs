//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and
//! the API server for the embedded finance assistant.

use finance_assistant_core::Utterance;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One user-composed chat message. Whitespace-only text is accepted and
    /// silently ignored by the engine.
    UserMessage { text: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when the connection opens, before any transcript entries.
    SessionInitialized { conversation_id: Uuid },

    /// One transcript entry (user or assistant); the assistant greeting is
    /// always the first. The client renders these verbatim, in order.
    Message { utterance: Utterance },

    /// The "assistant is composing" typing affordance turned on or off.
    Composing { active: bool },

    /// Reports a protocol error to the client.
    Error { message: String },
}
