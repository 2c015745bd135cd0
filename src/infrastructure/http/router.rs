use crate::infrastructure::http::controllers::{health, import_locks};
use crate::infrastructure::http::middleware::{require_identity, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    // Routes that act on behalf of an identified caller
    let owned = Router::new()
        .route(
            "/api/import-locks/acquire",
            post(import_locks::acquire_import_lock),
        )
        .route(
            "/api/import-locks/release",
            post(import_locks::release_import_lock),
        )
        .route(
            "/api/import-locks/sweep",
            post(import_locks::sweep_import_locks),
        )
        .layer(middleware::from_fn(require_identity));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/import-locks", get(import_locks::get_import_lock));

    Router::new()
        .merge(owned)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
