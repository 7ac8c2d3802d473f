use sqlx::{Pool, Sqlite};

use crate::db::models::User;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    /// Insert a user or refresh the existing row. Re-joining with the same
    /// name keeps the original `id` and `created_at`.
    pub async fn upsert(pool: &Pool<Sqlite>, name: &str) -> Result<User, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (name, created_at)
VALUES (?, ?)
ON CONFLICT(name) DO UPDATE SET name = excluded.name
RETURNING *
            "#,
        )
        .bind(name)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// All stored users, newest first.
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

}
