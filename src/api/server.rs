use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::catalog::AgentCatalog;
use crate::engine::RunLifecycle;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<RunLifecycle>,
    pub catalog: Arc<AgentCatalog>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/agents", get(handlers::list_agents))
        .route("/agents/:name", get(handlers::get_agent))
        .route("/runs", post(handlers::create_run))
        .route(
            "/runs/:run_id",
            get(handlers::get_run).post(handlers::resume_run),
        )
        .route("/runs/:run_id/cancel", post(handlers::cancel_run))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    println!("Herald agent server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
