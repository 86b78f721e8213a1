use providers::VideoRequest;
use shared::settings::ModelCatalog;
use shared::tool::{ToolInput, ToolKind, ToolOutput};
use shared::{OracleError, Result};

use super::{require_prompt, unexpected, Tool, ToolRequest, ToolResponse};
use crate::prompts::VIDEO_STYLE_SUFFIX;

const RESOLUTION: &str = "720p";

/// Short animation, optionally seeded from an uploaded image
pub struct VideoGenerationTool;

impl Tool for VideoGenerationTool {
    fn kind(&self) -> ToolKind {
        ToolKind::VideoGeneration
    }

    fn validate_input(&self, input: &ToolInput) -> Result<()> {
        require_prompt(input)?;
        match &input.attachment {
            Some(seed) if !seed.is_image() => Err(OracleError::invalid_input(
                "The starting frame must be an image.",
            )),
            _ => Ok(()),
        }
    }

    fn build_request(&self, input: &ToolInput, models: &ModelCatalog) -> ToolRequest {
        ToolRequest::Video(VideoRequest {
            model: models.video_model.clone(),
            prompt: format!("{}{}", input.prompt.trim(), VIDEO_STYLE_SUFFIX),
            aspect_ratio: input.aspect_ratio,
            resolution: RESOLUTION.to_string(),
            seed_image: input.attachment.clone(),
        })
    }

    fn normalize_result(&self, response: ToolResponse) -> Result<ToolOutput> {
        match response {
            ToolResponse::Video(handle) => Ok(ToolOutput::Video(handle)),
            ToolResponse::Content(_) => Err(unexpected(self.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::tool::{AspectRatio, MediaHandle, MediaPayload};
    use std::path::PathBuf;

    #[test]
    fn test_request_carries_ratio_and_seed() {
        let seed = MediaPayload {
            mime_type: "image/png".into(),
            data: "UE5H".into(),
        };
        let input = ToolInput::from_prompt("a goblin dancing")
            .with_aspect_ratio(AspectRatio::Portrait)
            .with_attachment(seed.clone());
        assert!(VideoGenerationTool.validate_input(&input).is_ok());

        let ToolRequest::Video(request) =
            VideoGenerationTool.build_request(&input, &ModelCatalog::default())
        else {
            panic!("expected video request");
        };
        assert_eq!(request.model, "veo-3.1-fast-generate-preview");
        assert_eq!(request.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(request.resolution, "720p");
        assert_eq!(request.seed_image, Some(seed));
        assert!(request.prompt.ends_with("runescape classic aesthetic"));
    }

    #[test]
    fn test_video_seed_rejected() {
        let input = ToolInput::from_prompt("dance").with_attachment(MediaPayload {
            mime_type: "video/mp4".into(),
            data: String::new(),
        });
        assert!(VideoGenerationTool.validate_input(&input).is_err());
    }

    #[test]
    fn test_normalize_passes_handle_through() {
        let handle = MediaHandle {
            path: PathBuf::from("/tmp/clip.mp4"),
            mime_type: "video/mp4".into(),
            size_bytes: 10,
        };
        let output = VideoGenerationTool
            .normalize_result(ToolResponse::Video(handle.clone()))
            .unwrap();
        assert_eq!(output, ToolOutput::Video(handle));
    }
}
