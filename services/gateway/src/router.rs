use std::time::Duration;

use crate::handlers::{self, exchange, kyc_aml, trading};
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Every OPTIONS request is answered by the CORS layer as a preflight.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/exchange",
            get(exchange::get)
                .post(exchange::post)
                .put(exchange::put)
                .fallback(handlers::invalid_method),
        )
        .route(
            "/kyc-aml",
            get(kyc_aml::get)
                .post(kyc_aml::post)
                .put(kyc_aml::put)
                .fallback(handlers::invalid_method),
        )
        .route(
            "/trading",
            get(trading::get)
                .post(trading::post)
                .put(trading::put)
                .fallback(handlers::invalid_method),
        );

    Router::new()
        .merge(api_routes)
        .route("/health", get(handlers::health))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
        .max_age(PREFLIGHT_MAX_AGE)
}
