use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
};
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod activity;
pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;

/// Full application: routes plus timeout, body limit, CORS, and tracing layers
pub fn app(state: config::AppState, env_vars: &config::EnvVars) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(env_vars.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(auth::USERNAME_HEADER),
        ])
        .allow_credentials(true);

    routes::router(state)
        .layer(TimeoutLayer::new(Duration::from_millis(
            env_vars.request_timeout_in_ms,
        )))
        .layer(RequestBodyLimitLayer::new(env_vars.request_body_size_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
}
