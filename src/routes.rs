// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::session, state::AppState, utils::jwt::auth_middleware};

/// Assembles the main application router.
///
/// * Every session route requires a valid bearer token.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (services and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/", get(session::list_sessions))
        .route("/{id}/submit", post(session::submit_session))
        .route("/{id}/result", get(session::get_result))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
