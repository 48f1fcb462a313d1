//! API Routes
//!
//! Configures the Axum router with all transient endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_all_handler, delete_handler, get_handler, health_handler, list_handler, set_handler,
    sweep_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/transients", get(list_handler).delete(delete_all_handler))
        .route(
            "/transients/:key",
            get(get_handler)
                .put(set_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .route("/sweep", post(sweep_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
