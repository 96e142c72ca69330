use actix_web::{HttpResponse, Responder, get, http::header::ContentType};

const INDEX_HTML: &str = include_str!("../../static/index.html");
const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

/// Login / signup page
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

/// Check-in page; redirects to `/` client-side when no login is stored
#[get("/dashboard")]
pub async fn dashboard() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(DASHBOARD_HTML)
}
