// Route table.
//
// The JSON API routes sit behind the Accept-header gate; the web-flow
// routes (`/`, `/health`, the OAuth redirect targets) respond to plain
// browser requests and are exempt.
use axum::middleware;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use crate::middleware::content::require_json_accept;
use crate::state::AppState;

pub mod boats;
pub mod loads;
pub mod users;
pub mod utils;

use utils::collection_not_allowed;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/boats",
            get(boats::list)
                .post(boats::create)
                .put(collection_not_allowed)
                .patch(collection_not_allowed)
                .delete(collection_not_allowed),
        )
        .route(
            "/boats/:boat_id",
            get(boats::fetch)
                .patch(boats::patch)
                .put(boats::replace)
                .delete(boats::remove),
        )
        .route("/boats/:boat_id/loads", get(boats::list_loads))
        .route(
            "/boats/:boat_id/loads/:load_id",
            axum::routing::put(boats::attach_load).delete(boats::detach_load),
        )
        .route(
            "/loads",
            get(loads::list)
                .post(loads::create)
                .put(collection_not_allowed)
                .patch(collection_not_allowed)
                .delete(collection_not_allowed),
        )
        .route(
            "/loads/:load_id",
            get(loads::fetch)
                .patch(loads::patch)
                .put(loads::replace)
                .delete(loads::remove),
        )
        .route("/users", get(users::list))
        .route("/users/:user_id", get(users::fetch))
        .route_layer(middleware::from_fn(require_json_accept))
}

pub fn web_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_index))
        .route("/health", get(health))
        .route("/users/login", get(users::login))
        .route("/users/signup", get(users::signup))
}

async fn service_index() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/boats", "/loads", "/users"],
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
