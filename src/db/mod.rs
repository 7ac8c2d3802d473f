pub mod models;
pub mod users;
pub mod messages;

pub use models::{Message, User};
pub use users::UserRepository;
pub use messages::MessageRepository;

/// In-memory SQLite pool with migrations applied, for tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::Pool<sqlx::Sqlite> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    pool
}
