//! Media acquisition: uploads into base64 payloads, results into local files.
//!
//! The declared media type is trusted as-is; file contents are never sniffed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shared::settings::AppSettings;
use shared::tool::{MediaHandle, MediaPayload};
use shared::{OracleError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Media type implied by a file extension
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => FALLBACK_MIME,
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/L16" | "audio/pcm" => "pcm",
        _ => "bin",
    }
}

pub fn encode_payload(bytes: &[u8], mime_type: impl Into<String>) -> MediaPayload {
    MediaPayload {
        mime_type: mime_type.into(),
        data: STANDARD.encode(bytes),
    }
}

/// Read an uploaded file into a transport payload.
///
/// `declared_type` is what the picker reported; the extension is only used
/// when nothing was declared.
pub async fn load_file(path: &Path, declared_type: Option<&str>) -> Result<MediaPayload> {
    let bytes = tokio::fs::read(path).await?;
    let mime_type = declared_type
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| guess_mime_type(path).to_string());
    debug!(path = %path.display(), %mime_type, size = bytes.len(), "loaded upload");
    Ok(encode_payload(&bytes, mime_type))
}

/// Split a `data:<mime>;base64,<data>` URI into media type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| OracleError::invalid_input("not a data URI"))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| OracleError::invalid_input("data URI has no payload"))?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
        OracleError::invalid_input("only base64 data URIs are supported")
    })?;
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| OracleError::invalid_input(format!("invalid base64 payload: {}", e)))?;
    Ok((mime_type.to_string(), bytes))
}

/// Directory holding locally playable copies of generated media
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Settings override, else the platform cache dir, else the temp dir.
    pub fn from_settings(settings: &AppSettings) -> Self {
        if let Some(dir) = &settings.media_dir {
            return Self::new(dir.clone());
        }
        let dir = directories::ProjectDirs::from("com.local", "Oracle", "Oracle")
            .map(|p| p.cache_dir().join("media"))
            .unwrap_or_else(|| std::env::temp_dir().join("oracle-media"));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn store(&self, bytes: &[u8], mime_type: &str) -> Result<MediaHandle> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self
            .dir
            .join(format!("{}.{}", Uuid::new_v4(), extension_for(mime_type)));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "stored media");
        Ok(MediaHandle {
            path,
            mime_type: mime_type.to_string(),
            size_bytes: bytes.len() as u64,
        })
    }
}
