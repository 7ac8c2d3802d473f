use sqlx::{Pool, Sqlite};

use crate::registry::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub registry: SessionRegistry,
}
