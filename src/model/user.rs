use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    /// argon2 PHC string, or a legacy unsalted sha256 hex digest
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub employee_id: Option<u64>,
    pub created_at: NaiveDateTime,
}

/// Validated signup input, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}
