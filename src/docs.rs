use crate::model::employee::Employee;
use crate::models::{
    AuthResponse, CheckInReq, CheckInResponse, HealthResponse, LocationsResponse, LoginReq,
    MessageType, SignupReq,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Staff attendance tracker

Employees sign up or log in, pick the location they are working at, and press
one button to check in or out.

### 🔹 Check-in toggle
- The first press at a location opens a session for today
- The next press at the same location closes it and reports the worked time
- While a session is open at one location, pressing at another one is refused
  with a `warning` until the employee checks out of the first

### 🔐 Security
Signup and login return a **JWT bearer token**. The check-in endpoint accepts
it optionally; when sent, it must belong to the employee being checked in.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::signup,
        crate::auth::handlers::login,

        crate::api::attendance::check_in,
        crate::api::attendance::list_locations,

        crate::api::health::health
    ),
    components(
        schemas(
            SignupReq,
            LoginReq,
            AuthResponse,
            CheckInReq,
            CheckInResponse,
            MessageType,
            LocationsResponse,
            HealthResponse,
            Employee
        )
    ),
    tags(
        (name = "Auth", description = "Signup and login"),
        (name = "Attendance", description = "Check-in / check-out"),
        (name = "Health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/api/signup", "/api/login", "/api/checkin", "/api/locations", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from OpenAPI");
        }
    }
}
