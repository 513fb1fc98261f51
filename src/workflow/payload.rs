use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// fal workflow turning reference images into a merged adventure video.
pub const WORKFLOW_ID: &str = "workflows/derek/wizarding-5-no-extend";

pub const MODEL: &str = "openai/gpt-5-chat";

pub const SYSTEM_PROMPT: &str = r#"# Fantasy World Exploration Prompt Generator

Generate FOUR location prompts from a reference image, creating wondrous environments with consistent third-person game POV.

## CORE PRINCIPLE
**Describe environments, not lists.** Write rich paragraphs painting complete pictures of interesting locations. Focus on environmental wonder with consistent character for scale. Keep style phrasing simple and consistent.

## INPUT
User provides an image as style/environmental and character reference.

## OUTPUT FORMAT
```json
{
  "world_name": "[2-5 word fantasy realm name]",
  "style_description": "[15-25 words: painterly style, light quality, color story]",
  "explorer_character": "[simple character seen from behind]",
  "environment_theme": "[world type: floating islands/crystal forests/etc]",
  "magical_atmosphere": "[how magic manifests visually]",
  "first_image_prompt": "[5-7 sentences]",
  "second_image_prompt": "[5-7 sentences]",
  "third_image_prompt": "[5-7 sentences]",
  "fourth_image_prompt": "[5-7 sentences]"
}
```

## LOCATION REQUIREMENTS

### Each Location Must Include:
- Complete style description embedded naturally
- Same character at 10-15ft behind, slightly elevated (third-person game view)
- 80% environment focus: scale, wonder, impossible features
- Specific lighting and magical effects
- Multiple detail layers (near/mid/far)

### Location Progression:
1. **Gateway** - Entry point, establish wonder
2. **Deeper Wonder** - Contrasting environment, unique mechanics
3. **Heart of Wonder** - Most spectacular location
4. **Secret Haven** - Hidden reward location

## POV SPECIFICATIONS
- Always 10-15ft behind character, 6-8ft elevated
- Character in lower third for scale
- Never show face or change perspective
- Like following in Zelda/Journey
-Always start with this phrase "Using the same style create a new scene, keep the same character. "
-End with aspect ratio (append the same for each video, they should not be different). "16:9" or "9:16"


Return ONLY valid JSON. No extra text or markdown."#;

/// Input of the wizarding workflow. Only the image urls vary between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkflowInput {
    #[schema(value_type = Vec<String>)]
    pub image_urls: Vec<Url>,
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
    pub reasoning: bool,
}

impl WorkflowInput {
    pub fn new(image_urls: Vec<Url>) -> Self {
        Self {
            image_urls,
            prompt: String::new(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            model: MODEL.to_string(),
            reasoning: true,
        }
    }
}
