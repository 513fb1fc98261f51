use super::{progress::ProgressError, task::WorkflowTask};
use crate::state::AppState;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("api key is not set")]
    MissingCredentials,
    #[error("no images staged")]
    NoImages,
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Prepare a new submission of the currently staged images.
///
/// Resets the progress of the previous run and marks the app busy, the caller
/// is expected to drive the returned task with [`WorkflowTask::run`].
pub async fn start_workflow(app_state: &AppState) -> Result<WorkflowTask, SubmitError> {
    if !app_state.credential().read().await.is_set() {
        return Err(SubmitError::MissingCredentials);
    }

    // staged images stay in place, a later submission uploads them again
    let images = app_state.staging().read().await.images().to_vec();
    if images.is_empty() {
        return Err(SubmitError::NoImages);
    }

    let task = WorkflowTask::new(images, app_state.progress());

    {
        let progress = app_state.progress();
        let mut progress = progress.write().await;
        progress.begin(task.id())?;
    }

    Ok(task)
}
