//! Route configuration.

use crate::auth::trace_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let sync_routes = Router::new()
        .route(
            "/v1/sync/{app_id}/{root_id}/{device_id}/{event_id}",
            get(handlers::download_blob)
                .put(handlers::upload_blob)
                .delete(handlers::delete_blob),
        )
        .route("/v1/sync/{app_id}/{root_id}", get(handlers::list_blobs));

    let api_routes = Router::new()
        .route("/v1/capabilities", get(handlers::get_capabilities))
        // Health check (intentionally unauthenticated for load balancers and k8s)
        .route("/v1/health", get(handlers::health_check));

    let mut router = Router::new().merge(sync_routes).merge(api_routes);

    // SECURITY: When enabled, this endpoint MUST be network-restricted
    // to authorized Prometheus scraper IPs only.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
