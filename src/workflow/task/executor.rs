use crate::{
    fal::{ClientError, FalApi, WorkflowStream},
    staging::StagedImage,
    workflow::{
        event::{EventKind, WorkflowEvent, WorkflowResult},
        payload::{WorkflowInput, WORKFLOW_ID},
        progress::ProgressState,
        stage,
    },
};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

pub struct TaskExecutor {
    client: Arc<dyn FalApi>,
    progress: Arc<RwLock<ProgressState>>,
}

impl TaskExecutor {
    pub fn new(client: Arc<dyn FalApi>, progress: Arc<RwLock<ProgressState>>) -> Self {
        Self { client, progress }
    }

    /// Upload images one after another. Urls are returned in input order.
    pub async fn upload_all(&self, images: &[StagedImage]) -> Result<Vec<Url>, ClientError> {
        let mut urls = Vec::with_capacity(images.len());

        for image in images {
            let url = self.client.upload(image).await?;
            tracing::debug!("uploaded {} to {}", image.name(), url);
            urls.push(url);
        }

        Ok(urls)
    }

    pub async fn invoke(&self, image_urls: Vec<Url>) -> Result<WorkflowStream, ClientError> {
        let input = WorkflowInput::new(image_urls);
        tracing::debug!("submitting workflow with {} images", input.image_urls.len());

        self.client.stream(WORKFLOW_ID, &input).await
    }

    async fn on_event(&self, event: WorkflowEvent) {
        match event.kind {
            EventKind::Completion | EventKind::Output => {
                tracing::info!("workflow event: {:?}", &event);
            }
            EventKind::Error => {
                tracing::warn!("workflow step error: {:?}", &event);
            }
            _ => {
                tracing::debug!("workflow event: {:?}", &event);
            }
        }

        let mut progress = self.progress.write().await;
        progress.apply(event);
    }

    /// Upload, invoke and follow the workflow until it resolves.
    pub async fn run(&self, images: &[StagedImage]) -> Result<WorkflowResult, ClientError> {
        let image_urls = self.upload_all(images).await?;

        {
            let mut progress = self.progress.write().await;
            progress.set_stage(stage::GENERATING_DESCRIPTIONS);
        }

        let mut stream = self.invoke(image_urls).await?;

        while let Some(event) = stream.next_event().await {
            self.on_event(event?).await;
        }

        let result = stream.done().await?;
        tracing::info!("final result: {:?}", &result);

        {
            let mut progress = self.progress.write().await;
            progress.complete(result.clone());
        }

        Ok(result)
    }
}
