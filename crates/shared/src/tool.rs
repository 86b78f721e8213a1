//! Tool mode types: inputs, outputs and execution records.
//!
//! Each non-chat screen (image generation, image edit, video generation,
//! content analysis) is a tool. The UI hands a [`ToolInput`] to the host and
//! renders whatever [`ToolExecution`] comes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Tool modes that share the tools screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    ImageGeneration,
    ImageEdit,
    VideoGeneration,
    Analysis,
}

impl ToolKind {
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::ImageGeneration,
            ToolKind::ImageEdit,
            ToolKind::VideoGeneration,
            ToolKind::Analysis,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::ImageGeneration => "Concept Art (Gen)",
            ToolKind::ImageEdit => "Magic Edit",
            ToolKind::VideoGeneration => "Veo Animator",
            ToolKind::Analysis => "Analyze Content",
        }
    }
}

/// Output resolution tier for generated images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1K" => Some(ImageSize::OneK),
            "2K" => Some(ImageSize::TwoK),
            "4K" => Some(ImageSize::FourK),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "16:9" => Some(AspectRatio::Landscape),
            "9:16" => Some(AspectRatio::Portrait),
            _ => None,
        }
    }
}

/// Binary upload in transport form: base64 plus its declared media type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mime_type: String,
    pub data: String,
}

impl MediaPayload {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Locally playable copy of generated media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    pub prompt: String,
    pub attachment: Option<MediaPayload>,
    #[serde(default)]
    pub image_size: ImageSize,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl ToolInput {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_attachment(mut self, attachment: MediaPayload) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOutput {
    /// `data:image/png;base64,...`
    Image { data_uri: String },
    Video(MediaHandle),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

/// Record of a single tool run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    pub id: Uuid,
    pub kind: ToolKind,
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub output: Option<ToolOutput>,
    /// Display string for the UI when the run did not complete
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ToolExecution {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            status: ExecutionStatus::Running,
            output: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn complete(mut self, output: ToolOutput, duration_ms: u64) -> Self {
        self.status = ExecutionStatus::Completed;
        self.output = Some(output);
        self.duration_ms = duration_ms;
        self
    }

    pub fn fail(mut self, status: ExecutionStatus, error: impl Into<String>, duration_ms: u64) -> Self {
        self.status = status;
        self.error = Some(error.into());
        self.duration_ms = duration_ms;
        self
    }
}
