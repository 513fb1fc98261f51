pub const UPLOADING: &str = "Uploading images...";
pub const GENERATING_DESCRIPTIONS: &str = "Generating adventure video descriptions...";
pub const ANALYZING: &str = "Analyzing your image and generating world descriptions...";
pub const CREATING_IMAGES: &str = "Creating adventure video images...";
pub const CONVERTING_VIDEOS: &str = "Converting images to videos...";
pub const MERGING_VIDEOS: &str = "Merging videos into final result...";
pub const COMPLETE: &str = "Complete!";

/// Number of videos the workflow converts before merging them.
pub const EXPECTED_VIDEOS: u32 = 4;

pub fn videos_progress(completed: u32) -> String {
    format!(
        "{} ({} out of {} complete)",
        CONVERTING_VIDEOS, completed, EXPECTED_VIDEOS
    )
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Maps a node id to a human readable stage label.
pub struct StageRule {
    predicate: Predicate,
    label: String,
}

impl StageRule {
    pub fn new(
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        label: impl Into<String>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            label: label.into(),
        }
    }

    /// Rule matching any node id containing `pattern`.
    pub fn contains(pattern: &'static str, label: impl Into<String>) -> Self {
        Self::new(move |node_id: &str| node_id.contains(pattern), label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for StageRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Ordered list of rules, the first matching rule wins.
#[derive(Debug)]
pub struct StageClassifier {
    rules: Vec<StageRule>,
}

impl StageClassifier {
    pub fn new(rules: Vec<StageRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, node_id: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(node_id))
            .map(StageRule::label)
    }
}

impl Default for StageClassifier {
    fn default() -> Self {
        Self::new(vec![
            StageRule::contains("any_llm/vision", ANALYZING),
            StageRule::contains("nano_banana", CREATING_IMAGES),
            StageRule::contains("veo3", CONVERTING_VIDEOS),
            StageRule::contains("ffmpeg", MERGING_VIDEOS),
        ])
    }
}
