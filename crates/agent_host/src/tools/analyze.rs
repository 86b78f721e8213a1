use providers::{ContentPart, ContentRequest};
use shared::settings::ModelCatalog;
use shared::tool::{ToolInput, ToolKind, ToolOutput};
use shared::{OracleError, Result};
use tracing::debug;

use super::{unexpected, Tool, ToolRequest, ToolResponse};
use crate::normalizer;
use crate::prompts::DEFAULT_ANALYSIS_PROMPT;

/// Describes an uploaded screenshot or clip
pub struct AnalysisTool;

impl Tool for AnalysisTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Analysis
    }

    fn validate_input(&self, input: &ToolInput) -> Result<()> {
        if input.attachment.is_none() {
            return Err(OracleError::invalid_input("Please upload a file to analyze."));
        }
        Ok(())
    }

    fn build_request(&self, input: &ToolInput, models: &ModelCatalog) -> ToolRequest {
        let prompt = match input.prompt.trim() {
            "" => DEFAULT_ANALYSIS_PROMPT.to_string(),
            prompt => prompt.to_string(),
        };
        let mut parts = Vec::with_capacity(2);
        if let Some(file) = &input.attachment {
            debug!(mime_type = %file.mime_type, is_video = file.is_video(), "analyzing upload");
            parts.push(ContentPart::Inline(file.clone()));
        }
        parts.push(ContentPart::Text(prompt));
        ToolRequest::Content(ContentRequest::new(models.analysis_model.clone(), parts))
    }

    fn normalize_result(&self, response: ToolResponse) -> Result<ToolOutput> {
        match response {
            ToolResponse::Content(envelope) => {
                Ok(ToolOutput::Text(normalizer::analysis_text(&envelope)))
            }
            ToolResponse::Video(_) => Err(unexpected(self.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::ResponseEnvelope;
    use shared::tool::MediaPayload;

    fn clip() -> MediaPayload {
        MediaPayload {
            mime_type: "video/webm".into(),
            data: "Q0xJUA==".into(),
        }
    }

    #[test]
    fn test_requires_upload() {
        let err = AnalysisTool
            .validate_input(&ToolInput::from_prompt("what is this"))
            .unwrap_err();
        assert_eq!(err.user_message(), "Please upload a file to analyze.");
    }

    #[test]
    fn test_empty_prompt_gets_default() {
        let input = ToolInput::default().with_attachment(clip());
        let ToolRequest::Content(request) =
            AnalysisTool.build_request(&input, &ModelCatalog::default())
        else {
            panic!("expected content request");
        };
        assert_eq!(request.model, "gemini-3-pro-preview");
        assert_eq!(request.parts[0], ContentPart::Inline(clip()));
        assert_eq!(request.prompt_text(), DEFAULT_ANALYSIS_PROMPT);
    }

    #[test]
    fn test_missing_text_falls_back() {
        let output = AnalysisTool
            .normalize_result(ToolResponse::Content(ResponseEnvelope::Text { text: None }))
            .unwrap();
        assert_eq!(output, ToolOutput::Text("Analysis failed.".into()));
    }
}
