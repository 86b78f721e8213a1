//! Shapes decoded backend envelopes into what the UI renders.

use providers::{Citation, ResponseEnvelope};
use shared::agent_api::{AudioClip, Source};
use shared::{OracleError, Result};

use crate::prompts::{ANALYSIS_FALLBACK, SILENT_ANSWER};

pub const IMAGE_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<Source>,
}

fn text_or(envelope: &ResponseEnvelope, fallback: &str) -> String {
    envelope
        .text()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Answer text (with placeholder) plus web citations in reported order
pub fn chat_reply(envelope: ResponseEnvelope) -> ChatReply {
    let text = text_or(&envelope, SILENT_ANSWER);
    let sources = match envelope {
        ResponseEnvelope::TextWithCitations { citations, .. } => citations
            .into_iter()
            .filter_map(|citation| match citation {
                Citation::Web(source) => Some(source),
                Citation::Other { .. } => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    ChatReply { text, sources }
}

pub fn analysis_text(envelope: &ResponseEnvelope) -> String {
    text_or(envelope, ANALYSIS_FALLBACK)
}

/// First inline binary part as a PNG data URI
pub fn image_data_uri(envelope: &ResponseEnvelope) -> Result<String> {
    match envelope {
        ResponseEnvelope::Media { blobs, .. } => blobs
            .first()
            .map(|blob| format!("{}{}", IMAGE_DATA_URI_PREFIX, blob.data))
            .ok_or_else(|| OracleError::generation("No image generated")),
        _ => Err(OracleError::generation("No image generated")),
    }
}

pub fn audio_clip(envelope: &ResponseEnvelope) -> Result<AudioClip> {
    match envelope {
        ResponseEnvelope::Media { blobs, .. } => blobs
            .first()
            .filter(|blob| !blob.data.is_empty())
            .map(|blob| AudioClip {
                mime_type: blob.mime_type.clone(),
                data: blob.data.clone(),
            })
            .ok_or_else(|| OracleError::generation("No audio generated")),
        _ => Err(OracleError::generation("No audio generated")),
    }
}
