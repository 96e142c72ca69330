//! Shared harness for handler tests: the full route table over an in-memory store.

/// Builds the service exactly as `main` wires it, backed by the given store.
macro_rules! test_app {
    ($store:expr) => {{
        let store: std::sync::Arc<dyn crate::store::Store> = std::sync::Arc::new($store);
        let config = crate::config::Config::for_tests();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(actix_web::web::Data::new(
                    crate::utils::email_registry::EmailRegistry::new(1_000, 0.001),
                ))
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| crate::routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

/// POSTs a JSON body; evaluates to `(StatusCode, serde_json::Value)`.
/// Requests carry a peer address so the rate limiter can key them.
macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr $(,)?) => {
        post_json!($app, $uri, $body, None::<&str>)
    };
    ($app:expr, $uri:expr, $body:expr, $bearer:expr $(,)?) => {{
        let mut req = actix_web::test::TestRequest::post()
            .uri($uri)
            .peer_addr(crate::test_support::PEER.parse().unwrap())
            .set_json($body);
        if let Some(token) = $bearer {
            req = req.insert_header(("Authorization", format!("Bearer {token}")));
        }
        let resp = actix_web::test::call_service($app, req.to_request()).await;
        let status: actix_web::http::StatusCode = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

/// GETs a path; evaluates to `(StatusCode, serde_json::Value)`.
macro_rules! get_json {
    ($app:expr, $uri:expr) => {{
        let req = actix_web::test::TestRequest::get()
            .uri($uri)
            .peer_addr(crate::test_support::PEER.parse().unwrap())
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        let status: actix_web::http::StatusCode = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

pub const PEER: &str = "127.0.0.1:40000";
