use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let relationships = Router::new()
        .route("/", get(handlers::relationships::list_contacts))
        .route("/stats", get(handlers::relationships::get_stats))
        .route("/{contactId}", get(handlers::relationships::get_contact))
        .route(
            "/{contactId}/recalculate",
            post(handlers::relationships::recalculate_contact),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route(
            "/relationships:track",
            post(handlers::relationships::track_event),
        )
        .nest("/relationships", relationships)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
