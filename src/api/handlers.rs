use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::types::{
    AgentManifest, AgentsListResponse, Run, RunCreateRequest, RunId, RunMode, RunResumeRequest,
};

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    10
}

pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_agents(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Json<AgentsListResponse> {
    Json(AgentsListResponse {
        agents: state.catalog.list(page.limit, page.offset).to_vec(),
    })
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentManifest>, ApiError> {
    state
        .catalog
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or(ApiError::AgentNotFound(name))
}

pub async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<RunCreateRequest>,
) -> Result<(StatusCode, Json<Run>), ApiError> {
    let mode = request.mode;
    let run = state.lifecycle.create_run(request).await?;

    // Async creation acknowledges an in-flight run; sync returns the
    // settled record.
    let code = match mode {
        RunMode::Async => StatusCode::ACCEPTED,
        RunMode::Sync => StatusCode::OK,
    };
    Ok((code, Json(run)))
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Json<Run>, ApiError> {
    Ok(Json(state.lifecycle.get_run(&run_id)?))
}

pub async fn resume_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
    Json(request): Json<RunResumeRequest>,
) -> Result<Json<Run>, ApiError> {
    Ok(Json(
        state.lifecycle.resume_run(&run_id, request.input).await?,
    ))
}

pub async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<(StatusCode, Json<Run>), ApiError> {
    Ok((
        StatusCode::ACCEPTED,
        Json(state.lifecycle.cancel_run(&run_id)?),
    ))
}
