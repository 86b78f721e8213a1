//! The seam between the orchestration layer and a generative backend.
//!
//! Every call takes the credential resolved for that call; implementations
//! never cache it. Responses are decoded once into a [`ResponseEnvelope`].

use async_trait::async_trait;
use shared::agent_api::{ConversationTurn, Source};
use shared::credentials::Credential;
use shared::tool::{AspectRatio, ImageSize, MediaPayload};
use shared::Result;

/// Backend-side tools a chat turn may attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendTool {
    WebSearch,
}

/// One chat turn: full prior history plus the new user text
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub model: String,
    pub system_instruction: String,
    pub tools: Vec<BackendTool>,
    pub reasoning_budget: Option<u32>,
    pub history: Vec<ConversationTurn>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Inline(MediaPayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub size: ImageSize,
    pub aspect_ratio: String,
}

/// Single-shot content generation (images, edits, analysis, speech)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub image: Option<ImageOptions>,
    /// Requests an audio response spoken with this prebuilt voice
    pub speech_voice: Option<String>,
}

impl ContentRequest {
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            parts,
            image: None,
            speech_voice: None,
        }
    }

    /// Concatenated text parts, as sent to the model
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Inline(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: String,
    pub seed_image: Option<MediaPayload>,
}

/// Opaque reference to a submitted long-running job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Done,
    Failed { message: String },
}

/// Backend snapshot of a video job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOperation {
    pub handle: OperationHandle,
    pub status: OperationStatus,
    /// Reference to the generated media once done
    pub result: Option<String>,
}

impl MediaOperation {
    pub fn is_done(&self) -> bool {
        !matches!(self.status, OperationStatus::Pending)
    }
}

/// Grounding chunk reported alongside an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    Web(Source),
    /// Non-web grounding (retrieved context and the like)
    Other { title: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    Text {
        text: Option<String>,
    },
    TextWithCitations {
        text: Option<String>,
        citations: Vec<Citation>,
    },
    Media {
        blobs: Vec<MediaPayload>,
        text: Option<String>,
    },
}

impl ResponseEnvelope {
    pub fn text(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Text { text }
            | ResponseEnvelope::TextWithCitations { text, .. }
            | ResponseEnvelope::Media { text, .. } => text.as_deref(),
        }
    }
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn chat_turn(
        &self,
        credential: &Credential,
        request: &ChatTurnRequest,
    ) -> Result<ResponseEnvelope>;

    async fn generate_content(
        &self,
        credential: &Credential,
        request: &ContentRequest,
    ) -> Result<ResponseEnvelope>;

    async fn submit_video(
        &self,
        credential: &Credential,
        request: &VideoRequest,
    ) -> Result<MediaOperation>;

    async fn operation_status(
        &self,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> Result<MediaOperation>;

    /// Download the raw bytes behind a finished operation's result reference
    async fn fetch_media(&self, credential: &Credential, reference: &str) -> Result<Vec<u8>>;
}
