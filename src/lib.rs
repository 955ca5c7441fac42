pub mod auth;
pub mod config;
pub mod datastore;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod relationship;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth::verify_bearer;
use crate::state::AppState;

/// Builds the full application router over the given state. Every request
/// passes through bearer-token tagging; the JSON API routes additionally
/// sit behind the Accept-header gate.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::api_routes())
        .merge(handlers::web_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            verify_bearer,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
