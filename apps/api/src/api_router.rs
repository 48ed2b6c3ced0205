use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/grants",
            get(handlers::grants::list_grants_handler).post(handlers::grants::create_grant_handler),
        )
        .route("/api/sweeps", post(handlers::sweeps::run_sweep_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
