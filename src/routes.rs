use crate::{
    api::{attendance, health, pages},
    auth::handlers,
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::JsonPayloadError, web};
use serde_json::json;
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // only fails for a zero period or burst, both clamped above
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Malformed JSON bodies get the same `{success, message}` shape as other errors.
fn json_error(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {err}")).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let checkin_limiter = Arc::new(build_limiter(config.rate_checkin_per_min));

    cfg.app_data(web::JsonConfig::default().error_handler(json_error));

    // Pages
    cfg.service(pages::index).service(pages::dashboard);

    cfg.service(web::resource("/health").route(web::get().to(health::health)));

    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/signup")
                    .wrap(signup_limiter)
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/checkin")
                    .wrap(checkin_limiter)
                    .route(web::post().to(attendance::check_in)),
            )
            .service(web::resource("/locations").route(web::get().to(attendance::list_locations))),
    );

    cfg.default_service(web::to(|| async {
        HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Not found"
        }))
    }));
}
