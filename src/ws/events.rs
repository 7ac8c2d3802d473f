use serde::{Deserialize, Serialize};

use crate::db::models::{Message, User};

/// Events a client may send over the WebSocket. Wire format is a JSON text
/// frame: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Join {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    PrivateMessage {
        receiver_name: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    GetChatHistory {
        other_user: String,
    },
}

/// Events the server emits, either to a single connection or as a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    JoinSuccess {
        name: String,
    },
    UserList(Vec<User>),
    /// Live delivery to the receiver, if online.
    NewMessage(MessagePayload),
    /// Echo to the sender, always.
    MessageSent(MessagePayload),
    #[serde(rename_all = "camelCase")]
    ChatHistory {
        other_user: String,
        messages: Vec<Message>,
    },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub sender_name: String,
    pub receiver_name: String,
    pub message: String,
    pub timestamp: i64,
}
