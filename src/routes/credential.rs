use super::{AppError, AppJson};
use crate::state::AppState;
use axum::{extract::State, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const OPENAPI_TAG: &str = "Credential";

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialRequest {
    api_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialStatus {
    is_set: bool,
}

/// Credential status
///
/// Whether a fal api key has been set for this session.
#[utoipa::path(
    get,
    path = "/credential",
    responses((status = OK, body = CredentialStatus)),
    tag = OPENAPI_TAG
)]
pub async fn credential_status(
    State(state): State<Arc<AppState>>,
) -> Result<AppJson<CredentialStatus>, AppError> {
    let credential = state.credential();
    let credential = credential.read().await;

    Ok(AppJson(CredentialStatus {
        is_set: credential.is_set(),
    }))
}

/// Set credential
///
/// Configure the fal client with an api key. Blank keys are ignored.
#[utoipa::path(
    post,
    path = "/credential",
    request_body = CredentialRequest,
    responses((status = OK, body = CredentialStatus)),
    tag = OPENAPI_TAG
)]
pub async fn submit_credential(
    State(state): State<Arc<AppState>>,
    AppJson(data): AppJson<CredentialRequest>,
) -> Result<AppJson<CredentialStatus>, AppError> {
    let credential = state.credential();
    let mut credential = credential.write().await;
    credential.submit(&data.api_key, state.client().as_ref());

    Ok(AppJson(CredentialStatus {
        is_set: credential.is_set(),
    }))
}

pub fn credential_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(credential_status).post(submit_credential))
}
