//! Scripted in-memory backend for host tests.

use async_trait::async_trait;
use providers::{
    ChatTurnRequest, ContentRequest, GenerativeBackend, MediaOperation, OperationHandle,
    OperationStatus, ResponseEnvelope, VideoRequest,
};
use shared::credentials::{Credential, CredentialProvider};
use shared::{OracleError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn pending() -> MediaOperation {
    MediaOperation {
        handle: OperationHandle("operations/test".into()),
        status: OperationStatus::Pending,
        result: None,
    }
}

pub fn done(reference: Option<&str>) -> MediaOperation {
    MediaOperation {
        handle: OperationHandle("operations/test".into()),
        status: OperationStatus::Done,
        result: reference.map(str::to_string),
    }
}

pub fn failed(message: &str) -> MediaOperation {
    MediaOperation {
        handle: OperationHandle("operations/test".into()),
        status: OperationStatus::Failed {
            message: message.into(),
        },
        result: None,
    }
}

pub fn text(value: &str) -> ResponseEnvelope {
    ResponseEnvelope::Text {
        text: Some(value.into()),
    }
}

#[derive(Default)]
struct Script {
    chat: VecDeque<Result<ResponseEnvelope>>,
    content: VecDeque<Result<ResponseEnvelope>>,
    operations: VecDeque<MediaOperation>,
    media: Option<Vec<u8>>,
    chat_requests: Vec<ChatTurnRequest>,
    content_requests: Vec<ContentRequest>,
    video_requests: Vec<VideoRequest>,
    fetched: Vec<String>,
    seen_keys: Vec<String>,
    status_calls: u32,
    status_stall: Option<Duration>,
}

/// Replays queued responses and records every request it receives
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }

    pub fn push_chat(&self, response: Result<ResponseEnvelope>) {
        self.script().chat.push_back(response);
    }

    pub fn push_content(&self, response: Result<ResponseEnvelope>) {
        self.script().content.push_back(response);
    }

    /// First queued operation answers the submit call, the rest answer polls
    pub fn push_operation(&self, operation: MediaOperation) {
        self.script().operations.push_back(operation);
    }

    /// Make every status call hang for `delay` before answering
    pub fn stall_status(&self, delay: Duration) {
        self.script().status_stall = Some(delay);
    }

    pub fn set_media(&self, bytes: Vec<u8>) {
        self.script().media = Some(bytes);
    }

    pub fn chat_requests(&self) -> Vec<ChatTurnRequest> {
        self.script().chat_requests.clone()
    }

    pub fn content_requests(&self) -> Vec<ContentRequest> {
        self.script().content_requests.clone()
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        self.script().video_requests.clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.script().status_calls
    }

    pub fn fetched_references(&self) -> Vec<String> {
        self.script().fetched.clone()
    }

    pub fn seen_keys(&self) -> Vec<String> {
        self.script().seen_keys.clone()
    }

    fn next_operation(&self, credential: &Credential) -> Result<MediaOperation> {
        let mut script = self.script();
        script.seen_keys.push(credential.expose().to_string());
        script
            .operations
            .pop_front()
            .ok_or_else(|| OracleError::network("no scripted operation left"))
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn chat_turn(
        &self,
        credential: &Credential,
        request: &ChatTurnRequest,
    ) -> Result<ResponseEnvelope> {
        let mut script = self.script();
        script.seen_keys.push(credential.expose().to_string());
        script.chat_requests.push(request.clone());
        script
            .chat
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::network("no scripted chat reply left")))
    }

    async fn generate_content(
        &self,
        credential: &Credential,
        request: &ContentRequest,
    ) -> Result<ResponseEnvelope> {
        let mut script = self.script();
        script.seen_keys.push(credential.expose().to_string());
        script.content_requests.push(request.clone());
        script
            .content
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::network("no scripted content reply left")))
    }

    async fn submit_video(
        &self,
        credential: &Credential,
        request: &VideoRequest,
    ) -> Result<MediaOperation> {
        self.script().video_requests.push(request.clone());
        self.next_operation(credential)
    }

    async fn operation_status(
        &self,
        credential: &Credential,
        _handle: &OperationHandle,
    ) -> Result<MediaOperation> {
        let stall = {
            let mut script = self.script();
            script.status_calls += 1;
            script.status_stall
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        self.next_operation(credential)
    }

    async fn fetch_media(&self, _credential: &Credential, reference: &str) -> Result<Vec<u8>> {
        let mut script = self.script();
        script.fetched.push(reference.to_string());
        script
            .media
            .clone()
            .ok_or_else(|| OracleError::network("no scripted media"))
    }
}

/// Hands out `key-1`, `key-2`, ... on successive lookups
#[derive(Default)]
pub struct RotatingCredentials {
    calls: AtomicU32,
}

impl RotatingCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialProvider for RotatingCredentials {
    fn credential(&self) -> Result<Credential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential::new(format!("key-{}", n)))
    }
}

/// Always fails, as when no key has been selected
pub struct MissingCredentials;

impl CredentialProvider for MissingCredentials {
    fn credential(&self) -> Result<Credential> {
        Err(OracleError::auth("GEMINI_API_KEY not set"))
    }
}
