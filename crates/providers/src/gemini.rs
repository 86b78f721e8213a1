use crate::backend::{
    BackendTool, ChatTurnRequest, Citation, ContentPart, ContentRequest, GenerativeBackend,
    MediaOperation, OperationHandle, OperationStatus, ResponseEnvelope, VideoRequest,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::agent_api::{ConversationTurn, Source};
use shared::credentials::{Credential, CredentialKind};
use shared::tool::MediaPayload;
use shared::{OracleError, Result};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(payload: &MediaPayload) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: payload.mime_type.clone(),
                data: payload.data.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    image_size: String,
    aspect_ratio: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.thinking_config.is_none()
            && self.image_config.is_none()
            && self.response_modalities.is_none()
            && self.speech_config.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidatePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingChunk {
    web: Option<WebChunk>,
    retrieved_context: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiOperation {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<Value>,
    error: Option<OperationError>,
}

pub struct GeminiClient {
    http: Client,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        credential: &Credential,
        body: &T,
    ) -> Result<Value> {
        let resp = authorize(self.http.post(url), credential)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        resp.json::<Value>().await.map_err(transport)
    }

    async fn generate(&self, credential: &Credential, model: &str, req: &GeminiRequest) -> Result<ResponseEnvelope> {
        let url = self.model_url(model, "generateContent");
        let value = self.post_json(&url, credential, req).await?;
        let body: GeminiResponse = serde_json::from_value(value)?;
        Ok(decode_envelope(body))
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn chat_turn(
        &self,
        credential: &Credential,
        request: &ChatTurnRequest,
    ) -> Result<ResponseEnvelope> {
        debug!(
            model = %request.model,
            history = request.history.len(),
            "gemini chat turn"
        );
        let req = build_chat_request(request);
        self.generate(credential, &request.model, &req).await
    }

    async fn generate_content(
        &self,
        credential: &Credential,
        request: &ContentRequest,
    ) -> Result<ResponseEnvelope> {
        debug!(model = %request.model, "gemini generate content");
        let req = build_content_request(request);
        self.generate(credential, &request.model, &req).await
    }

    async fn submit_video(
        &self,
        credential: &Credential,
        request: &VideoRequest,
    ) -> Result<MediaOperation> {
        let url = self.model_url(&request.model, "predictLongRunning");
        let value = self
            .post_json(&url, credential, &build_video_body(request))
            .await?;
        decode_operation(value)
    }

    async fn operation_status(
        &self,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> Result<MediaOperation> {
        let url = format!("{}/{}", self.api_base, handle.as_str());
        let resp = authorize(self.http.get(url), credential)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        let value = resp.json::<Value>().await.map_err(transport)?;
        decode_operation(value)
    }

    async fn fetch_media(&self, credential: &Credential, reference: &str) -> Result<Vec<u8>> {
        let url = media_url(reference, credential)?;
        let resp = authorize(self.http.get(url), credential)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

/// API keys go in `x-goog-api-key`; OAuth access tokens as a bearer header.
fn authorize(builder: RequestBuilder, credential: &Credential) -> RequestBuilder {
    match credential.kind() {
        CredentialKind::ApiKey => builder.header("x-goog-api-key", credential.expose()),
        CredentialKind::Bearer => builder.bearer_auth(credential.expose()),
    }
}

fn transport(err: reqwest::Error) -> OracleError {
    OracleError::network(err.to_string())
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail: String = body.trim().chars().take(800).collect();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(OracleError::auth(format!("gemini error: {} {}", status, detail)));
    }
    Err(OracleError::Api {
        status: status.as_u16(),
        detail: if detail.is_empty() {
            status.to_string()
        } else {
            detail
        },
    })
}

fn history_contents(history: &[ConversationTurn]) -> Vec<GeminiContent> {
    history
        .iter()
        .map(|turn| GeminiContent {
            role: Some(turn.role.wire_name().to_string()),
            parts: turn.parts.iter().map(GeminiPart::text).collect(),
        })
        .collect()
}

fn build_chat_request(request: &ChatTurnRequest) -> GeminiRequest {
    let mut contents = history_contents(&request.history);
    contents.push(GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart::text(request.message.clone())],
    });

    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| match tool {
            BackendTool::WebSearch => json!({ "googleSearch": {} }),
        })
        .collect();

    let generation_config = request.reasoning_budget.map(|budget| GenerationConfig {
        thinking_config: Some(ThinkingConfig {
            thinking_budget: budget,
        }),
        ..GenerationConfig::default()
    });

    GeminiRequest {
        contents,
        system_instruction: Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(request.system_instruction.clone())],
        }),
        tools: (!tools.is_empty()).then_some(tools),
        generation_config,
    }
}

fn build_content_request(request: &ContentRequest) -> GeminiRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => GeminiPart::text(text.clone()),
            ContentPart::Inline(payload) => GeminiPart::inline(payload),
        })
        .collect();

    let mut config = GenerationConfig::default();
    if let Some(image) = &request.image {
        config.image_config = Some(ImageConfig {
            image_size: image.size.as_str().to_string(),
            aspect_ratio: image.aspect_ratio.clone(),
        });
    }
    if let Some(voice) = &request.speech_voice {
        config.response_modalities = Some(vec!["AUDIO".to_string()]);
        config.speech_config = Some(json!({
            "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
        }));
    }

    GeminiRequest {
        contents: vec![GeminiContent { role: None, parts }],
        system_instruction: None,
        tools: None,
        generation_config: (!config.is_empty()).then_some(config),
    }
}

fn build_video_body(request: &VideoRequest) -> Value {
    let mut instance = json!({ "prompt": request.prompt });
    if let Some(seed) = &request.seed_image {
        instance["image"] = json!({
            "bytesBase64Encoded": seed.data,
            "mimeType": seed.mime_type,
        });
    }
    json!({
        "instances": [instance],
        "parameters": {
            "aspectRatio": request.aspect_ratio.as_str(),
            "resolution": request.resolution,
        }
    })
}

/// Decode the heterogeneous wire response into a tagged envelope.
fn decode_envelope(body: GeminiResponse) -> ResponseEnvelope {
    let Some(candidate) = body.candidates.into_iter().next() else {
        return ResponseEnvelope::Text { text: None };
    };

    let mut texts = Vec::new();
    let mut blobs = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if part.thought {
            continue;
        }
        if let Some(inline) = part.inline_data {
            blobs.push(MediaPayload {
                mime_type: inline.mime_type,
                data: inline.data,
            });
        }
        if let Some(text) = part.text {
            texts.push(text);
        }
    }
    let text = Some(texts.concat()).filter(|t| !t.is_empty());

    if !blobs.is_empty() {
        return ResponseEnvelope::Media { blobs, text };
    }

    let chunks = candidate
        .grounding_metadata
        .map(|meta| meta.grounding_chunks)
        .unwrap_or_default();
    if chunks.is_empty() {
        return ResponseEnvelope::Text { text };
    }

    let citations = chunks
        .into_iter()
        .map(|chunk| match chunk.web {
            Some(web) => Citation::Web(Source {
                title: web.title.unwrap_or_default(),
                uri: web.uri.unwrap_or_default(),
            }),
            None => Citation::Other {
                title: chunk.retrieved_context.and_then(|c| c.title),
            },
        })
        .collect();
    ResponseEnvelope::TextWithCitations { text, citations }
}

fn decode_operation(value: Value) -> Result<MediaOperation> {
    let op: GeminiOperation = serde_json::from_value(value)?;
    let result = op.response.as_ref().and_then(video_uri);
    let status = match (op.done, op.error) {
        (false, _) => OperationStatus::Pending,
        (true, Some(err)) => OperationStatus::Failed {
            message: err
                .message
                .unwrap_or_else(|| "video generation failed".to_string()),
        },
        (true, None) => OperationStatus::Done,
    };
    Ok(MediaOperation {
        handle: OperationHandle(op.name),
        status,
        result,
    })
}

fn video_uri(response: &Value) -> Option<String> {
    [
        "/generateVideoResponse/generatedSamples/0/video/uri",
        "/generatedVideos/0/video/uri",
    ]
    .iter()
    .find_map(|pointer| response.pointer(pointer).and_then(Value::as_str))
    .map(str::to_string)
}

fn media_url(reference: &str, credential: &Credential) -> Result<Url> {
    let mut url = Url::parse(reference)
        .map_err(|e| OracleError::operation(format!("invalid media reference: {}", e)))?;
    if credential.kind() == CredentialKind::ApiKey {
        url.query_pairs_mut().append_pair("key", credential.expose());
    }
    Ok(url)
}
