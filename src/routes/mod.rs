use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{catch_panic_layer, json_error_middleware},
    state::AppState,
};

pub mod api;
pub mod dashboard;
pub mod operation;
pub mod public;
pub mod reports;
pub mod requests;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(api::router(state.clone()))
        .merge(dashboard::router(state.clone()))
        .merge(reports::router(state))
}

/// The router with the envelope rewriting, panic catching and request
/// tracing layers the server runs with.
pub fn app(state: Arc<AppState>) -> Router {
    router(state)
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http())
}
