use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Jane Doe",
        "created_at": "2026-01-01T08:00:00"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Roster name. Signup links to an existing employee by exact match.
    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
