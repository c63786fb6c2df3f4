//! Axum application setup.

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/functions", get(handlers::list_functions))
        .route("/datasets", get(handlers::list_datasets))
        .route(
            "/datasets/:dataset/transformations",
            get(handlers::list_transformations).post(handlers::create_transformation),
        )
        .route(
            "/transformations/:id",
            patch(handlers::update_transformation).delete(handlers::delete_transformation),
        )
        .route(
            "/datasets/:dataset/columns/:column/reorder",
            post(handlers::reorder_column),
        )
        .route("/datasets/:dataset/cleanup", post(handlers::cleanup_dataset))
        .route("/datasets/:dataset/preview", post(handlers::preview_expression))
        .route("/datasets/:dataset/derived", get(handlers::derived_rows));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
