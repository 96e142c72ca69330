use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

#[cfg(test)]
#[macro_use]
mod test_support;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod utils;

use config::Config;
use db::{init_db, init_schema};
use store::{MySqlStore, Store};

use crate::docs::ApiDoc;
use crate::utils::email_registry::EmailRegistry;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.tracing_level())
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config).await?;
    init_schema(&pool).await?;

    let mysql = MySqlStore::new(pool);
    let registry = Data::new(EmailRegistry::default());

    let pool_for_warmup = mysql.pool().clone();
    let registry_for_warmup = registry.clone();
    actix_web::rt::spawn(async move {
        // every email into the filter, last 30 days of signups into the cache
        if let Err(e) = registry_for_warmup
            .warmup(&pool_for_warmup, 500, 30)
            .await
        {
            warn!(error = %e, "Failed to warm up email registry");
        }
    });

    let store: Data<dyn Store> = Data::from(Arc::new(mysql) as Arc<dyn Store>);
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(registry.clone())
            .app_data(config_data.clone())
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
