use providers::{ContentPart, ContentRequest, ImageOptions};
use shared::settings::ModelCatalog;
use shared::tool::{ToolInput, ToolKind, ToolOutput};
use shared::Result;

use super::{require_prompt, unexpected, Tool, ToolRequest, ToolResponse};
use crate::normalizer;
use crate::prompts::IMAGE_STYLE_SUFFIX;

/// Square concept art in the game's style
pub struct ImageGenerationTool;

impl Tool for ImageGenerationTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ImageGeneration
    }

    fn validate_input(&self, input: &ToolInput) -> Result<()> {
        require_prompt(input)
    }

    fn build_request(&self, input: &ToolInput, models: &ModelCatalog) -> ToolRequest {
        let prompt = format!("{}{}", input.prompt.trim(), IMAGE_STYLE_SUFFIX);
        let mut request =
            ContentRequest::new(models.image_model.clone(), vec![ContentPart::Text(prompt)]);
        request.image = Some(ImageOptions {
            size: input.image_size,
            aspect_ratio: "1:1".to_string(),
        });
        ToolRequest::Content(request)
    }

    fn normalize_result(&self, response: ToolResponse) -> Result<ToolOutput> {
        match response {
            ToolResponse::Content(envelope) => Ok(ToolOutput::Image {
                data_uri: normalizer::image_data_uri(&envelope)?,
            }),
            ToolResponse::Video(_) => Err(unexpected(self.kind())),
        }
    }
}
