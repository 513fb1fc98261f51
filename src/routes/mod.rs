pub mod credential;
pub mod download;
pub mod images;
pub mod workflow;

use crate::workflow::{progress::ProgressError, submit::SubmitError};
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::OpenApi;

// Create our own JSON extractor by wrapping `axum::Json`. This makes it easy to override the
// rejection and provide our own which formats errors to match our application.
//
// `axum::Json` responds with plain text if the input is invalid.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

pub enum AppError {
    JsonRejection(JsonRejection),
    BadRequest(anyhow::Error),
    Unauthorized(anyhow::Error),
    NotFoundError(anyhow::Error),
    Conflict(anyhow::Error),
    BadGateway(anyhow::Error),
}

// Tell axum how `AppError` should be converted into a response.
//
// This is also a convenient place to log errors.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // How we want errors responses to be serialized
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message) = match self {
            AppError::JsonRejection(rejection) => {
                // This error is caused by bad user input so don't log it
                (rejection.status(), rejection.body_text())
            }
            AppError::BadRequest(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            AppError::Unauthorized(error) => (StatusCode::UNAUTHORIZED, error.to_string()),
            AppError::NotFoundError(error) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", error))
            }
            AppError::Conflict(error) => (StatusCode::CONFLICT, error.to_string()),
            AppError::BadGateway(error) => {
                tracing::warn!("upstream error: {}", error);
                (StatusCode::BAD_GATEWAY, "Upstream request failed".to_string())
            }
        };

        (status, AppJson(ErrorResponse { message })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::JsonRejection(rejection)
    }
}

impl From<SubmitError> for AppError {
    fn from(error: SubmitError) -> Self {
        match error {
            SubmitError::MissingCredentials => Self::Unauthorized(error.into()),
            SubmitError::NoImages => Self::BadRequest(error.into()),
            SubmitError::Progress(ProgressError::AlreadyRunning) => Self::Conflict(error.into()),
        }
    }
}

pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        credential::credential_status,
        credential::submit_credential,
        images::list_images,
        images::upload_images,
        images::preview_image,
        images::remove_image,
        workflow::run_workflow,
        workflow::check_progress,
        workflow::list_events,
        download::download_result,
    ),
    components(schemas(
        credential::CredentialRequest,
        credential::CredentialStatus,
        images::StagedImagesResponse,
        crate::staging::StagedImageInfo,
        workflow::WorkflowResponse,
        workflow::WorkflowEvents,
        crate::workflow::progress::ProgressSnapshot,
        crate::workflow::event::EventKind,
        crate::workflow::event::EventError,
        crate::workflow::event::EventOutput,
        crate::workflow::event::FileDescriptor,
        crate::workflow::event::ResultOutput,
        crate::workflow::event::WorkflowEvent,
        crate::workflow::event::WorkflowResult,
    ))
)]
pub struct ApiDoc;
