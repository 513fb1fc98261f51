use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_STAGED_IMAGES: usize = 4;

/// A reference image selected by the user, kept in memory until removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedImage {
    name: String,
    content_type: String,
    data: Vec<u8>,
}

impl StagedImage {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StagedImageInfo {
    pub index: usize,
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ImageStaging {
    images: Vec<StagedImage>,
}

impl ImageStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the whole batch, or nothing at all if it would not fit.
    pub fn add(&mut self, batch: Vec<StagedImage>) -> bool {
        if self.images.len() + batch.len() > MAX_STAGED_IMAGES {
            tracing::debug!(
                "dropping batch of {} images, {} already staged",
                batch.len(),
                self.images.len()
            );
            return false;
        }

        self.images.extend(batch);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<StagedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&StagedImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn infos(&self) -> Vec<StagedImageInfo> {
        self.images
            .iter()
            .enumerate()
            .map(|(index, image)| StagedImageInfo {
                index,
                name: image.name.clone(),
                content_type: image.content_type.clone(),
                size: image.data.len(),
            })
            .collect()
    }
}
