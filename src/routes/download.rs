use super::AppError;
use crate::{download::download_video, state::AppState};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

const OPENAPI_TAG: &str = "Workflow";

/// Download result
///
/// Fetch the final video of the last run and return it as an attachment.
#[utoipa::path(
    get,
    path = "/workflow/result/download",
    responses(
        (status = OK, description = "Video file.", content_type = "video/mp4", body = Vec<u8>),
        (status = NOT_FOUND, description = "No result available.", body = String),
        (status = BAD_GATEWAY, description = "The video could not be fetched.", body = String)
    ),
    tag = OPENAPI_TAG
)]
pub async fn download_result(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let video = {
        let progress = app_state.progress();
        let progress = progress.read().await;
        progress.result().map(|result| result.video().clone())
    }
    .ok_or(AppError::NotFoundError(anyhow::anyhow!("result not found")))?;

    let client = app_state.client();
    let attachment = match download_video(client.as_ref(), &video).await {
        Ok(attachment) => attachment,
        Err(e) => {
            tracing::error!("download error: {}", e);
            return Err(AppError::BadGateway(e.into()));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type.clone()),
            (header::CONTENT_DISPOSITION, attachment.content_disposition()),
        ],
        attachment.data,
    ))
}

pub fn download_routes() -> Router<Arc<AppState>> {
    Router::new().route("/result/download", get(download_result))
}
