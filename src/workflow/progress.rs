use super::{
    event::{EventKind, FileDescriptor, WorkflowEvent, WorkflowResult},
    stage::{self, StageClassifier},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProgressError {
    #[error("a workflow is already running")]
    AlreadyRunning,
}

/// Progress of the current submission, derived from the events observed so far.
#[derive(Debug)]
pub struct ProgressState {
    classifier: Arc<StageClassifier>,
    run_id: Option<String>,
    busy: bool,
    current_stage: String,
    generated_images: Vec<FileDescriptor>,
    videos_completed: u32,
    result: Option<WorkflowResult>,
    log: Vec<WorkflowEvent>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    pub run_id: Option<String>,
    pub busy: bool,
    pub current_stage: String,
    pub generated_images: Vec<FileDescriptor>,
    pub videos_completed: u32,
    pub expected_videos: u32,
    pub result: Option<WorkflowResult>,
    /// Message of the last error event, if any.
    pub last_error: Option<String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new(Arc::new(StageClassifier::default()))
    }
}

impl ProgressState {
    pub fn new(classifier: Arc<StageClassifier>) -> Self {
        Self {
            classifier,
            run_id: None,
            busy: false,
            current_stage: String::new(),
            generated_images: vec![],
            videos_completed: 0,
            result: None,
            log: vec![],
        }
    }

    /// Start a fresh submission, resetting everything derived from the previous one.
    pub fn begin(&mut self, run_id: &str) -> Result<(), ProgressError> {
        if self.busy {
            return Err(ProgressError::AlreadyRunning);
        }

        self.run_id = Some(run_id.to_string());
        self.busy = true;
        self.current_stage = stage::UPLOADING.to_string();
        self.generated_images.clear();
        self.videos_completed = 0;
        self.result = None;
        self.log.clear();

        Ok(())
    }

    pub fn set_stage(&mut self, label: impl Into<String>) {
        self.current_stage = label.into();
    }

    /// Fold a single stream event into the derived state.
    pub fn apply(&mut self, event: WorkflowEvent) {
        match event.kind {
            EventKind::Submit => {
                if let Some(label) = event
                    .node_id
                    .as_deref()
                    .and_then(|node_id| self.classifier.classify(node_id))
                {
                    self.current_stage = label.to_string();
                }
            }
            EventKind::Completion => {
                let output = event.output.as_ref();

                if event.node_contains("nano_banana") {
                    if let Some(images) = output.and_then(|output| output.images.as_ref()) {
                        self.generated_images.extend(images.iter().cloned());
                    }
                }

                if event.node_contains("veo3/image_to_video")
                    && output.is_some_and(|output| output.video.is_some())
                {
                    self.videos_completed += 1;
                    self.current_stage = stage::videos_progress(self.videos_completed);
                }
            }
            _ => {}
        }

        self.log.push(event);
    }

    pub fn complete(&mut self, result: WorkflowResult) {
        self.result = Some(result);
        self.current_stage = stage::COMPLETE.to_string();
    }

    /// Record a local failure. The stage label keeps its last value.
    pub fn fail(&mut self, message: impl Into<String>, details: Option<Value>) {
        self.log.push(WorkflowEvent::failure(message, details));
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn current_stage(&self) -> &str {
        &self.current_stage
    }

    pub fn generated_images(&self) -> &[FileDescriptor] {
        &self.generated_images
    }

    pub fn videos_completed(&self) -> u32 {
        self.videos_completed
    }

    pub fn result(&self) -> Option<&WorkflowResult> {
        self.result.as_ref()
    }

    pub fn log(&self) -> &[WorkflowEvent] {
        &self.log
    }

    pub fn last_error(&self) -> Option<&WorkflowEvent> {
        self.log
            .iter()
            .rev()
            .find(|event| event.kind == EventKind::Error)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            run_id: self.run_id.clone(),
            busy: self.busy,
            current_stage: self.current_stage.clone(),
            generated_images: self.generated_images.clone(),
            videos_completed: self.videos_completed,
            expected_videos: stage::EXPECTED_VIDEOS,
            result: self.result.clone(),
            last_error: self.last_error().map(|event| {
                event
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown error".into())
            }),
        }
    }
}
