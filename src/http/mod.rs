mod routes;
mod types;

use crate::http::routes::*;
use crate::relay::RelayManager;
use axum::http::{HeaderName, HeaderValue};
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Clone)]
pub struct HttpState {
    pub relay: RelayManager,
}

pub fn create_app(relay: RelayManager) -> axum::Router {
    let router = axum::Router::new()
        .route("/", get(health))
        .route("/webhook", post(webhook))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-version"),
            HeaderValue::from_static(crate::VERSION),
        ))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let state = HttpState { relay };
    router.with_state(state)
}
