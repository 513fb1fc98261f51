use super::WorkflowTask;
use crate::{
    fal::FalApi,
    staging::StagedImage,
    workflow::{progress::ProgressState, task::executor::TaskExecutor},
};
use std::sync::Arc;
use tokio::sync::RwLock;

impl WorkflowTask {
    pub fn new(images: Vec<StagedImage>, progress: Arc<RwLock<ProgressState>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            images,
            progress,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    /// Run the submission to the end. Failures are recorded in the progress log
    /// and the busy flag is always cleared.
    #[tracing::instrument(skip_all, fields(run_id = %self.id))]
    pub async fn run(&self, client: Arc<dyn FalApi>) {
        tracing::info!("running workflow with {} images", self.images.len());

        let executor = TaskExecutor::new(client, self.progress.clone());
        let outcome = executor.run(&self.images).await;

        let mut progress = self.progress.write().await;
        if let Err(e) = outcome {
            tracing::error!("workflow error: {}", e);
            let details = e.details();
            if let Some(details) = &details {
                tracing::error!("error details: {}", details);
            }
            progress.fail(e.to_string(), details);
        }
        progress.finish();
    }
}
