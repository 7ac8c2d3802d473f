//! WebSocket upgrade, per-connection loop, and event dispatch.
//!
//! Each connection runs two tasks: this read loop and a writer draining the
//! connection's event channel into the socket. Everything a client can do
//! goes through `handle_event`, which is where the Unjoined/Joined state
//! machine lives. A connection is Joined iff the registry has a name for it.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::db::{MessageRepository, UserRepository};
use crate::registry::ConnectionId;
use crate::ws::events::{ClientEvent, MessagePayload, ServerEvent};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| ws_connection(socket, state))
}

async fn ws_connection(socket: WebSocket, state: AppState) {
    let id = Uuid::new_v4();
    tracing::info!("client connected: {}", id);

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.connect(id, tx).await;

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize event: {}", e);
                    continue;
                }
            };
            if sink.send(WsMessage::Text(json.into())).await.is_err() {
                break; // client gone
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let WsMessage::Text(text) = frame else {
            continue;
        };
        let Ok(event) = serde_json::from_str::<ClientEvent>(&text) else {
            tracing::debug!("dropping unparseable frame from {}", id);
            continue;
        };
        handle_event(&state, id, event).await;
    }

    writer.abort();
    handle_disconnect(&state, id).await;
}

pub(crate) async fn handle_event(state: &AppState, id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::Join { name } => join(state, id, name).await,
        ClientEvent::PrivateMessage {
            receiver_name,
            message,
        } => private_message(state, id, receiver_name, message).await,
        ClientEvent::GetChatHistory { other_user } => chat_history(state, id, other_user).await,
    }
}

pub(crate) async fn handle_disconnect(state: &AppState, id: ConnectionId) {
    if let Some(name) = state.registry.disconnect(id).await {
        tracing::info!("{} disconnected", name);
        broadcast_user_list(state).await;
    }
}

async fn join(state: &AppState, id: ConnectionId, name: String) {
    // Persistence is best-effort: a store failure leaves the user out of the
    // roster but the session still joins.
    if let Err(e) = UserRepository::upsert(&state.db, &name).await {
        tracing::warn!("failed to persist user {}: {}", name, e);
    }

    state.registry.set_name(id, &name).await;
    tracing::info!("{} joined the chat", name);

    broadcast_user_list(state).await;
    state
        .registry
        .send_to(id, ServerEvent::JoinSuccess { name })
        .await;
}

async fn private_message(state: &AppState, id: ConnectionId, receiver_name: String, body: String) {
    let Some(sender_name) = state.registry.name_of(id).await else {
        state
            .registry
            .send_to(id, ServerEvent::Error("You must join first".to_string()))
            .await;
        return;
    };

    // Delivery proceeds even if the durable write failed.
    if let Err(e) = MessageRepository::append(&state.db, &sender_name, &receiver_name, &body).await
    {
        tracing::error!("failed to persist message: {}", e);
    }

    let payload = MessagePayload {
        sender_name,
        receiver_name: receiver_name.clone(),
        message: body,
        timestamp: chrono::Utc::now().timestamp(),
    };

    if let Some(receiver) = state.registry.sender_for(&receiver_name).await {
        let _ = receiver.send(ServerEvent::NewMessage(payload.clone()));
    }

    state
        .registry
        .send_to(id, ServerEvent::MessageSent(payload))
        .await;
}

async fn chat_history(state: &AppState, id: ConnectionId, other_user: String) {
    let Some(name) = state.registry.name_of(id).await else {
        state
            .registry
            .send_to(id, ServerEvent::Error("You must join first".to_string()))
            .await;
        return;
    };

    let messages = match MessageRepository::conversation(&state.db, &name, &other_user).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::warn!("failed to load conversation: {}", e);
            Vec::new()
        }
    };

    state
        .registry
        .send_to(
            id,
            ServerEvent::ChatHistory {
                other_user,
                messages,
            },
        )
        .await;
}

/// Presence broadcast: the full stored-user snapshot goes to every
/// connection, joined or not. The roster is all persisted users, not just
/// the ones currently online.
async fn broadcast_user_list(state: &AppState) {
    let users = match UserRepository::list(&state.db).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!("failed to load user list: {}", e);
            Vec::new()
        }
    };
    tracing::debug!("broadcasting roster of {} users", users.len());
    state.registry.broadcast(ServerEvent::UserList(users)).await;
}
