use providers::{ContentPart, ContentRequest};
use shared::settings::ModelCatalog;
use shared::tool::{ToolInput, ToolKind, ToolOutput};
use shared::{OracleError, Result};

use super::{require_prompt, unexpected, Tool, ToolRequest, ToolResponse};
use crate::normalizer;
use crate::prompts::EDIT_STYLE_SUFFIX;

/// Prompted edit of an uploaded image
pub struct ImageEditTool;

impl Tool for ImageEditTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ImageEdit
    }

    fn validate_input(&self, input: &ToolInput) -> Result<()> {
        if input.attachment.is_none() {
            return Err(OracleError::invalid_input("Please upload an image to edit."));
        }
        require_prompt(input)
    }

    fn build_request(&self, input: &ToolInput, models: &ModelCatalog) -> ToolRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &input.attachment {
            parts.push(ContentPart::Inline(image.clone()));
        }
        parts.push(ContentPart::Text(format!(
            "{}{}",
            input.prompt.trim(),
            EDIT_STYLE_SUFFIX
        )));
        ToolRequest::Content(ContentRequest::new(models.image_edit_model.clone(), parts))
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
