use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Submit,
    Completion,
    Error,
    Output,
    /// Any event type this app does not react to, kept for the log.
    #[default]
    #[serde(other)]
    Other,
}

/// Descriptor of a file hosted by fal, used for generated images and videos.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileDescriptor {
    #[schema(value_type = String)]
    pub url: Url,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl FileDescriptor {
    /// File size in megabytes with one decimal, e.g. `12.3 MB`.
    pub fn size_label(&self) -> Option<String> {
        self.file_size
            .map(|size| format!("{:.1} MB", size as f64 / 1024.0 / 1024.0))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<FileDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<FileDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub body: Value,
}

/// A single status update of a running workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkflowEvent {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EventError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<EventOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

impl WorkflowEvent {
    /// Event recorded locally when uploading, invoking or streaming fails.
    pub fn failure(message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            kind: EventKind::Error,
            node_id: None,
            app_id: None,
            request_id: None,
            message: Some(message.into()),
            error: None,
            output: None,
            details: Some(details.unwrap_or_else(|| Value::from("No additional details"))),
        }
    }

    /// Placeholder for a payload that does not decode as an event. The raw
    /// payload is kept in `details`.
    pub fn undecodable(raw: Value, reason: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Other,
            node_id: None,
            app_id: None,
            request_id: None,
            message: Some(reason.into()),
            error: None,
            output: None,
            details: Some(raw),
        }
    }

    /// Whether the event was emitted by a node whose id contains `pattern`.
    pub fn node_contains(&self, pattern: &str) -> bool {
        self.node_id
            .as_deref()
            .is_some_and(|node_id| node_id.contains(pattern))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultOutput {
    pub video: FileDescriptor,
}

/// Terminal payload of a successful workflow run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkflowResult {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
    pub output: ResultOutput,
}

impl WorkflowResult {
    pub fn video(&self) -> &FileDescriptor {
        &self.output.video
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_completion_with_images() {
        let event: WorkflowEvent = serde_json::from_value(json!({
            "type": "completion",
            "node_id": "node_2/fal-ai/nano_banana/edit",
            "output": {
                "images": [{
                    "url": "https://v3.fal.media/files/a.png",
                    "content_type": "image/png",
                    "file_name": "a.png",
                    "file_size": null
                }],
                "description": ""
            }
        }))
        .unwrap();

        assert_eq!(event.kind, EventKind::Completion);
        assert!(event.node_contains("nano_banana"));
        let images = event.output.unwrap().images.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_size, None);
    }

    #[test]
    fn unknown_event_types_are_tolerated() {
        let event: WorkflowEvent =
            serde_json::from_value(json!({ "type": "heartbeat", "node_id": "x" })).unwrap();
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn failure_defaults_details() {
        let event = WorkflowEvent::failure("network error", None);
        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.message.as_deref(), Some("network error"));
        assert_eq!(event.details, Some(json!("No additional details")));
    }

    #[test]
    fn parses_error_without_status() {
        let event: WorkflowEvent = serde_json::from_value(json!({
            "type": "error",
            "node_id": "node_4/veo3/image_to_video",
            "error": { "body": "timeout" }
        }))
        .unwrap();

        let error = event.error.unwrap();
        assert_eq!(error.status, None);
        assert_eq!(error.body, json!("timeout"));
    }

    #[test]
    fn parses_result_and_formats_size() {
        let result: WorkflowResult = serde_json::from_value(json!({
            "type": "output",
            "output": {
                "video": {
                    "url": "https://v3.fal.media/files/final.mp4",
                    "content_type": "video/mp4",
                    "file_name": "final.mp4",
                    "file_size": 12_897_485u64
                }
            }
        }))
        .unwrap();

        assert_eq!(result.video().file_name, "final.mp4");
        assert_eq!(result.video().size_label().as_deref(), Some("12.3 MB"));
    }
}
