use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SignupReq {
    #[schema(example = "Jane Doe")]
    #[serde(default)]
    pub name: String,
    #[schema(example = "jane@company.com", format = "email")]
    #[serde(default)]
    pub email: String,
    #[schema(example = "hunter22")]
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@company.com", format = "email")]
    #[serde(default)]
    pub email: String,
    #[schema(example = "hunter22")]
    #[serde(default)]
    pub password: String,
}

/// Returned by both signup and login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    #[schema(example = "Login successful!")]
    pub message: String,
    #[schema(example = 12)]
    pub user_id: u64,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
    #[schema(example = 4, nullable = true)]
    pub employee_id: Option<u64>,
    /// Bearer token; optional on check-in, binds the request to this employee.
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    /// Number or numeric string. `id` is accepted as an alias.
    #[schema(value_type = u64, example = 4)]
    #[serde(default, alias = "id")]
    pub employee_id: Value,
    #[schema(example = "Mitte")]
    #[serde(default)]
    pub location: String,
}

impl CheckInReq {
    pub fn parsed_employee_id(&self) -> Option<u64> {
        match &self.employee_id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub success: bool,
    #[schema(example = "✅ WELCOME!\nJane Doe\n🕐 Check-in: 09:00\n📍 Mitte")]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl CheckInResponse {
    pub fn success(message: String) -> Self {
        Self {
            success: true,
            message,
            kind: MessageType::Success,
        }
    }

    pub fn warning(message: String) -> Self {
        Self {
            success: false,
            message,
            kind: MessageType::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: MessageType::Error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "connected")]
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationsResponse {
    #[schema(example = json!(["Mitte", "Spandau"]))]
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// login email
    pub sub: String,
    pub exp: usize,
    pub jti: String,
    pub employee_id: Option<u64>,
}
