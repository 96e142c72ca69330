use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::{models::HealthResponse, store::Store};

/// Liveness probe that round-trips the database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(store: web::Data<dyn Store>) -> impl Responder {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".into(),
            database: "connected".into(),
        }),
        Err(e) => {
            error!(error = %e, "Health check failed");
            HttpResponse::InternalServerError().json(HealthResponse {
                status: "unhealthy".into(),
                database: "disconnected".into(),
            })
        }
    }
}
