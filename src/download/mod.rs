use crate::{
    fal::{ClientError, FalApi},
    workflow::event::FileDescriptor,
};

pub const DEFAULT_FILE_NAME: &str = "adventure_video.mp4";

/// A remote file fetched into memory, ready to be saved by the browser.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// `Content-Disposition` value asking the browser to save the file.
    pub fn content_disposition(&self) -> String {
        let file_name: String = self
            .file_name
            .chars()
            .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
            .collect();

        format!("attachment; filename=\"{}\"", file_name)
    }
}

pub fn attachment_name(video: &FileDescriptor) -> &str {
    if video.file_name.trim().is_empty() {
        DEFAULT_FILE_NAME
    } else {
        &video.file_name
    }
}

/// Fetch `video` fully into memory.
pub async fn download_video(
    client: &dyn FalApi,
    video: &FileDescriptor,
) -> Result<Attachment, ClientError> {
    tracing::info!("downloading {}", video.url);
    let data = client.fetch(&video.url).await?;

    let content_type = if video.content_type.is_empty() {
        "video/mp4".to_string()
    } else {
        video.content_type.clone()
    };

    Ok(Attachment {
        file_name: attachment_name(video).to_string(),
        content_type,
        data,
    })
}
