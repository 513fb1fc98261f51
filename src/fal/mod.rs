mod client;
mod stream;

pub use client::FalClient;
pub use stream::{decode_sse, WorkflowStream};

use crate::{staging::StagedImage, workflow::payload::WorkflowInput};
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("credentials are not configured")]
    MissingCredentials,
    /// fal answered with a non-success status.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Extra detail worth keeping next to the message, i.e. the response body.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Api { body, .. } => Some(body.clone()),
            _ => None,
        }
    }
}

/// The subset of the fal api the app needs.
pub trait FalApi: Send + Sync {
    /// Set the credential used by every following call.
    fn configure(&self, credential: &str);

    /// Upload an image to fal storage and return its public url.
    fn upload<'a>(&'a self, image: &'a StagedImage) -> BoxFuture<'a, Result<Url, ClientError>>;

    /// Start a workflow and return its event stream.
    fn stream<'a>(
        &'a self,
        workflow_id: &'a str,
        input: &'a WorkflowInput,
    ) -> BoxFuture<'a, Result<WorkflowStream, ClientError>>;

    /// Fetch a remote file fully into memory.
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, ClientError>>;
}
