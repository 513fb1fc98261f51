use super::{AppError, AppJson};
use crate::{
    state::AppState,
    workflow::{event::WorkflowEvent, progress::ProgressSnapshot, submit::start_workflow},
};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const OPENAPI_TAG: &str = "Workflow";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowResponse {
    id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowEvents {
    events: Vec<WorkflowEvent>,
}

/// Run workflow
///
/// Upload the staged images and start the wizarding workflow in the background.
#[utoipa::path(
    post,
    path = "/workflow",
    responses(
        (status = OK, body = WorkflowResponse),
        (status = BAD_REQUEST, description = "No image staged.", body = String),
        (status = UNAUTHORIZED, description = "Api key not set.", body = String),
        (status = CONFLICT, description = "A workflow is already running.", body = String)
    ),
    tag = OPENAPI_TAG
)]
pub async fn run_workflow(
    State(app_state): State<Arc<AppState>>,
) -> Result<AppJson<WorkflowResponse>, AppError> {
    let task = start_workflow(&app_state).await?;
    let task_id = task.id().to_string();
    let client = app_state.client();

    tokio::spawn(async move {
        task.run(client).await;
    });

    Ok(AppJson(WorkflowResponse { id: task_id }))
}

/// Check progress
///
/// Progress of the current or last workflow run.
#[utoipa::path(
    get,
    path = "/workflow/progress",
    responses((status = OK, body = ProgressSnapshot)),
    tag = OPENAPI_TAG
)]
pub async fn check_progress(
    State(app_state): State<Arc<AppState>>,
) -> Result<AppJson<ProgressSnapshot>, AppError> {
    let progress = app_state.progress();
    let progress = progress.read().await;

    Ok(AppJson(progress.snapshot()))
}

/// List events
///
/// Every event received during the current or last run, including local errors.
#[utoipa::path(
    get,
    path = "/workflow/events",
    responses((status = OK, body = WorkflowEvents)),
    tag = OPENAPI_TAG
)]
pub async fn list_events(
    State(app_state): State<Arc<AppState>>,
) -> Result<AppJson<WorkflowEvents>, AppError> {
    let progress = app_state.progress();
    let progress = progress.read().await;

    Ok(AppJson(WorkflowEvents {
        events: progress.log().to_vec(),
    }))
}

pub fn workflow_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(run_workflow))
        .route("/progress", get(check_progress))
        .route("/events", get(list_events))
}
