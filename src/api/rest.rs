use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::state::AppState;
use crate::db::{Message, MessageRepository, User, UserRepository};

/// GET /api/users
///
/// Store failures degrade to an empty list, same as the roster broadcast.
pub async fn get_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = match UserRepository::list(&state.db).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!("failed to load user list: {}", e);
            Vec::new()
        }
    };
    Json(users)
}

/// GET /api/chat/{user1}/{user2}
pub async fn get_chat(
    State(state): State<AppState>,
    Path((user1, user2)): Path<(String, String)>,
) -> Json<Vec<Message>> {
    let messages = match MessageRepository::conversation(&state.db, &user1, &user2).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::warn!("failed to load conversation: {}", e);
            Vec::new()
        }
    };
    Json(messages)
}
