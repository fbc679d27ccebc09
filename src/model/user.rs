use chrono::{DateTime, Utc};
use serde::Serialize;

/// Login identity backing a member record.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}
