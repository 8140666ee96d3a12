pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use rest::{
    analyze_handler, delete_history_handler, health_handler, history_stats_handler,
    list_history_handler,
};
pub use state::AppState;

/// Builds the API router. Every route except `/health` sits behind the session guard.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/analyze", post(analyze_handler))
        .route(
            "/history",
            get(list_history_handler).delete(delete_history_handler),
        )
        .route("/history/stats", get(history_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
