use super::{AppError, AppJson};
use crate::{
    staging::{ImageStaging, StagedImage, StagedImageInfo, MAX_STAGED_IMAGES},
    state::AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const OPENAPI_TAG: &str = "Images";

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StagedImagesResponse {
    /// `false` when the last batch was dropped for exceeding the capacity.
    accepted: bool,
    capacity: usize,
    images: Vec<StagedImageInfo>,
}

impl StagedImagesResponse {
    fn new(staging: &ImageStaging, accepted: bool) -> Self {
        Self {
            accepted,
            capacity: MAX_STAGED_IMAGES,
            images: staging.infos(),
        }
    }
}

/// List images
///
/// List the images staged for the next submission.
#[utoipa::path(
    get,
    path = "/images",
    responses((status = OK, body = StagedImagesResponse)),
    tag = OPENAPI_TAG
)]
pub async fn list_images(
    State(state): State<Arc<AppState>>,
) -> Result<AppJson<StagedImagesResponse>, AppError> {
    let staging = state.staging();
    let staging = staging.read().await;

    Ok(AppJson(StagedImagesResponse::new(&staging, true)))
}

/// Add images
///
/// Stage a batch of images sent as multipart form data. A batch that would
/// exceed the capacity of four images is dropped as a whole.
#[utoipa::path(
    post,
    path = "/images",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = OK, body = StagedImagesResponse),
        (status = BAD_REQUEST, description = "A part is not an image.", body = String)
    ),
    tag = OPENAPI_TAG
)]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<AppJson<StagedImagesResponse>, AppError> {
    let mut batch = vec![];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.into()))?
    {
        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("image-{}", batch.len() + 1));
        let content_type = field.content_type().unwrap_or_default().to_string();

        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "{} is not an image ({})",
                name,
                content_type
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.into()))?;
        batch.push(StagedImage::new(name, content_type, data.to_vec()));
    }

    let staging = state.staging();
    let mut staging = staging.write().await;
    let accepted = staging.add(batch);

    Ok(AppJson(StagedImagesResponse::new(&staging, accepted)))
}

/// Preview image
///
/// Raw bytes of a staged image.
#[utoipa::path(
    get,
    path = "/images/{index}",
    params(("index" = usize, Path, description = "Position of the image")),
    responses(
        (status = OK, description = "Image bytes.", content_type = "image/*", body = Vec<u8>),
        (status = NOT_FOUND, description = "No image at this position.", body = String)
    ),
    tag = OPENAPI_TAG
)]
pub async fn preview_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, AppError> {
    let staging = state.staging();
    let staging = staging.read().await;

    match staging.get(index) {
        Some(image) => Ok((
            [(header::CONTENT_TYPE, image.content_type().to_string())],
            image.data().to_vec(),
        )),
        None => Err(AppError::NotFoundError(anyhow::anyhow!(
            "image {} not found",
            index
        ))),
    }
}

/// Remove image
///
/// Remove a staged image, keeping the order of the others.
#[utoipa::path(
    delete,
    path = "/images/{index}",
    params(("index" = usize, Path, description = "Position of the image")),
    responses(
        (status = OK, body = StagedImagesResponse),
        (status = NOT_FOUND, description = "No image at this position.", body = String)
    ),
    tag = OPENAPI_TAG
)]
pub async fn remove_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<AppJson<StagedImagesResponse>, AppError> {
    let staging = state.staging();
    let mut staging = staging.write().await;

    match staging.remove(index) {
        Some(_) => Ok(AppJson(StagedImagesResponse::new(&staging, true))),
        None => Err(AppError::NotFoundError(anyhow::anyhow!(
            "image {} not found",
            index
        ))),
    }
}

pub fn image_routes(max_body_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_images).post(upload_images))
        .route("/:index", get(preview_image).delete(remove_image))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
