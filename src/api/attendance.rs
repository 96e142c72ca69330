use crate::{
    attendance::toggle::{MAX_LOCATION_LEN, ToggleError, ToggleOutcome, toggle},
    auth::auth::OptionalAuth,
    config::Config,
    models::{CheckInReq, CheckInResponse, LocationsResponse},
    store::Store,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use tracing::{error, info, instrument, warn};

/// Check-in / check-out toggle
///
/// Closes the open session at `location` if there is one, otherwise opens a
/// new one. Refused with a warning while a session is open elsewhere today.
#[utoipa::path(
    post,
    path = "/api/checkin",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked in, checked out, or refused", body = CheckInResponse, example = json!({
            "success": true,
            "message": "✅ WELCOME!\nJane Doe\n🕐 Check-in: 09:00\n📍 Mitte",
            "type": "success"
        })),
        (status = 401, description = "Bearer token present but invalid"),
        (status = 403, description = "Bearer token belongs to another employee", body = CheckInResponse),
        (status = 500, description = "Store unavailable", body = CheckInResponse)
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_checkin", skip_all)]
pub async fn check_in(
    auth: OptionalAuth,
    payload: web::Json<CheckInReq>,
    store: web::Data<dyn Store>,
) -> impl Responder {
    let Some(employee_id) = payload.parsed_employee_id() else {
        info!(raw = %payload.employee_id, "Rejected check-in: invalid id");
        return HttpResponse::Ok().json(CheckInResponse::error("❌ ERROR!\nInvalid ID format."));
    };

    if let OptionalAuth(Some(user)) = &auth {
        if user.employee_id != Some(employee_id) {
            warn!(
                user_id = user.user_id,
                email = %user.email,
                employee_id,
                "Token does not match requested employee"
            );
            return HttpResponse::Forbidden().json(CheckInResponse::error(
                "❌ ERROR!\nYou can only check in for yourself.",
            ));
        }
    }

    let now = Local::now().naive_local();

    match toggle(store.get_ref(), employee_id, &payload.location, now).await {
        Ok(outcome) => {
            info!(employee_id, outcome = %outcome.kind(), "Check-in handled");
            let message = outcome.message();
            let body = match outcome {
                ToggleOutcome::Conflict { .. } => CheckInResponse::warning(message),
                _ => CheckInResponse::success(message),
            };
            HttpResponse::Ok().json(body)
        }
        Err(ToggleError::MissingLocation) => HttpResponse::Ok().json(CheckInResponse::error(
            "❌ ERROR!\nPlease select a location.",
        )),
        Err(ToggleError::LocationTooLong) => HttpResponse::Ok().json(CheckInResponse::error(
            format!("❌ ERROR!\nLocation must be at most {MAX_LOCATION_LEN} characters."),
        )),
        Err(ToggleError::UnknownEmployee(id)) => HttpResponse::Ok().json(CheckInResponse::error(
            format!("❌ ERROR!\nEmployee with ID {id} not found!"),
        )),
        Err(ToggleError::Store(e)) => {
            error!(error = %e, employee_id, "Check-in failed");
            HttpResponse::InternalServerError()
                .json(CheckInResponse::error("❌ ERROR!\nServer error, please try again."))
        }
    }
}

/// Locations offered on the dashboard
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, description = "Configured locations", body = LocationsResponse)
    ),
    tag = "Attendance"
)]
pub async fn list_locations(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(LocationsResponse {
        locations: config.locations.clone(),
    })
}
