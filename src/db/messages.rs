use sqlx::{Pool, Sqlite};

use crate::db::models::Message;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    /// Append one immutable message row.
    pub async fn append(
        pool: &Pool<Sqlite>,
        sender_name: &str,
        receiver_name: &str,
        body: &str,
    ) -> Result<Message, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let message = sqlx::query_as::<_, Message>(
            r#"
INSERT INTO messages (sender_name, receiver_name, message, created_at)
VALUES (?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(sender_name)
        .bind(receiver_name)
        .bind(body)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// All messages between two users, in either direction, oldest first.
    /// Symmetric in its arguments.
    pub async fn conversation(
        pool: &Pool<Sqlite>,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
SELECT * FROM messages
WHERE (sender_name = ? AND receiver_name = ?)
   OR (sender_name = ? AND receiver_name = ?)
ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_append_and_fetch() {
        let pool = test_pool().await;

        let stored = MessageRepository::append(&pool, "alice", "bob", "hi")
            .await
            .unwrap();
        assert_eq!(stored.sender_name, "alice");
        assert_eq!(stored.receiver_name, "bob");
        assert_eq!(stored.message, "hi");

        let conv = MessageRepository::conversation(&pool, "alice", "bob")
            .await
            .unwrap();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv[0].message, "hi");
    }

    #[tokio::test]
    async fn test_conversation_is_symmetric() {
        let pool = test_pool().await;

        MessageRepository::append(&pool, "alice", "bob", "hi")
            .await
            .unwrap();
        MessageRepository::append(&pool, "bob", "alice", "hey")
            .await
            .unwrap();
        MessageRepository::append(&pool, "alice", "carol", "unrelated")
            .await
            .unwrap();

        let ab = MessageRepository::conversation(&pool, "alice", "bob")
            .await
            .unwrap();
        let ba = MessageRepository::conversation(&pool, "bob", "alice")
            .await
            .unwrap();

        assert_eq!(ab.len(), 2);
        let ids_ab: Vec<i64> = ab.iter().map(|m| m.id).collect();
        let ids_ba: Vec<i64> = ba.iter().map(|m| m.id).collect();
        assert_eq!(ids_ab, ids_ba);
    }

    #[tokio::test]
    async fn test_conversation_ordered_oldest_first() {
        let pool = test_pool().await;

        for body in ["one", "two", "three"] {
            MessageRepository::append(&pool, "alice", "bob", body)
                .await
                .unwrap();
        }

        let conv = MessageRepository::conversation(&pool, "alice", "bob")
            .await
            .unwrap();
        let bodies: Vec<&str> = conv.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);

        let mut prev = i64::MIN;
        for m in &conv {
            assert!(m.created_at >= prev);
            prev = m.created_at;
        }
    }
}
