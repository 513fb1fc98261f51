pub mod executor;
pub mod impls;

use super::progress::ProgressState;
use crate::staging::StagedImage;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One submission of the staged images to the wizarding workflow.
#[derive(Clone, Debug)]
pub struct WorkflowTask {
    id: String,
    images: Vec<StagedImage>,
    progress: Arc<RwLock<ProgressState>>,
}
