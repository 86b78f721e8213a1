//! Oracle host - the game-guide assistant behind every screen
//!
//! This crate provides:
//! - Chat turns with model/tool selection and tooltip markup in answers
//! - Image generation, image editing, video generation and content analysis
//! - Polling of long-running video jobs with cancellation
//! - Text-to-speech for assistant messages

pub mod conversation;
pub mod markup;
pub mod media;
pub mod normalizer;
pub mod poller;
pub mod prompts;
pub mod selector;
pub mod tool_executor;
pub mod tools;

#[cfg(test)]
mod test_support;

use providers::{ChatTurnRequest, ContentPart, ContentRequest, GenerativeBackend};
use shared::agent_api::{AudioClip, Message, RequestConfig};
use shared::credentials::CredentialProvider;
use shared::events::ToolEvent;
use shared::settings::AppSettings;
use shared::tool::{MediaHandle, MediaPayload, ToolExecution, ToolInput, ToolKind, ToolOutput};
use shared::{OracleError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

pub use conversation::{Conversation, PendingTurn};
pub use media::MediaStore;
pub use normalizer::ChatReply;
pub use poller::PollPolicy;
pub use selector::{select_plan, RequestPlan};
pub use tool_executor::{ToolContext, ToolExecutor};
pub use tools::{init_registry, Tool, ToolRegistry};

/// Oracle host owns the backend, the credential source and the tool registry
pub struct OracleHost {
    backend: Arc<dyn GenerativeBackend>,
    credentials: Arc<dyn CredentialProvider>,
    settings: AppSettings,
    registry: ToolRegistry,
    executor: ToolExecutor,
    media_store: MediaStore,
}

impl OracleHost {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        credentials: Arc<dyn CredentialProvider>,
        settings: AppSettings,
    ) -> Self {
        let media_store = MediaStore::from_settings(&settings);
        let executor = ToolExecutor::new(PollPolicy::from(&settings.video));
        Self {
            backend,
            credentials,
            settings,
            registry: init_registry(),
            executor,
            media_store,
        }
    }

    pub fn with_media_store(mut self, store: MediaStore) -> Self {
        self.media_store = store;
        self
    }

    /// Stream tool progress to the caller
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<ToolEvent>) -> Self {
        self.executor = ToolExecutor::new(PollPolicy::from(&self.settings.video)).with_events(sender);
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn media_store(&self) -> &MediaStore {
        &self.media_store
    }

    /// Send one chat turn and shape the answer
    pub async fn chat_turn(&self, turn: &PendingTurn, config: &RequestConfig) -> Result<ChatReply> {
        let plan = select_plan(config, &self.settings.models);
        info!(
            model = %plan.model,
            search = plan.uses_search(),
            reasoning_budget = ?plan.reasoning_budget,
            history = turn.history.len(),
            "sending chat turn"
        );

        let request = ChatTurnRequest {
            model: plan.model.clone(),
            system_instruction: prompts::system_instruction(config.topic_category),
            tools: plan.tools.clone(),
            reasoning_budget: plan.reasoning_budget,
            history: turn.history.clone(),
            message: plan.apply_to_prompt(&turn.text),
        };

        let credential = self.credentials.credential()?;
        let envelope = self.backend.chat_turn(&credential, &request).await?;
        Ok(normalizer::chat_reply(envelope))
    }

    /// Record the user's message, run the turn and append the reply.
    ///
    /// Backend failures become an in-conversation apology; only a busy
    /// conversation or blank input is returned as an error.
    pub async fn submit_chat<'c>(
        &self,
        conversation: &'c mut Conversation,
        text: &str,
        config: &RequestConfig,
    ) -> Result<&'c Message> {
        let turn = conversation.begin_turn(text)?;
        let reply = match self.chat_turn(&turn, config).await {
            Ok(reply) => Message::assistant(reply.text, reply.sources),
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                Message::assistant(prompts::CHAT_FAILURE, Vec::new())
            }
        };
        Ok(conversation.finish_turn(reply))
    }

    /// Run a tool mode. Invalid input is an error; everything else is in the record.
    pub async fn run_tool(
        &self,
        kind: ToolKind,
        input: ToolInput,
        cancel: CancellationToken,
    ) -> Result<ToolExecution> {
        let (tool, ctx) = self.tool_context(kind, cancel)?;
        self.executor.execute(tool, input, ctx).await
    }

    fn tool_context(
        &self,
        kind: ToolKind,
        cancel: CancellationToken,
    ) -> Result<(&Arc<dyn Tool>, ToolContext<'_>)> {
        let tool = self
            .registry
            .get(kind)
            .ok_or_else(|| OracleError::invalid_input(format!("{} is unavailable", kind.display_name())))?;
        let ctx = ToolContext {
            backend: self.backend.as_ref(),
            credentials: self.credentials.as_ref(),
            models: &self.settings.models,
            store: &self.media_store,
            cancel,
        };
        Ok((tool, ctx))
    }

    /// Concept art; returns a `data:` URI
    pub async fn generate_image(&self, input: ToolInput) -> Result<String> {
        match self.run_to_output(ToolKind::ImageGeneration, input, CancellationToken::new()).await? {
            ToolOutput::Image { data_uri } => Ok(data_uri),
            _ => Err(OracleError::generation("No image generated")),
        }
    }

    pub async fn edit_image(&self, prompt: &str, image: MediaPayload) -> Result<String> {
        let input = ToolInput::from_prompt(prompt).with_attachment(image);
        match self.run_to_output(ToolKind::ImageEdit, input, CancellationToken::new()).await? {
            ToolOutput::Image { data_uri } => Ok(data_uri),
            _ => Err(OracleError::generation("No image generated")),
        }
    }

    pub async fn generate_video(&self, input: ToolInput, cancel: CancellationToken) -> Result<MediaHandle> {
        match self.run_to_output(ToolKind::VideoGeneration, input, cancel).await? {
            ToolOutput::Video(handle) => Ok(handle),
            _ => Err(OracleError::operation("Video generation failed")),
        }
    }

    pub async fn analyze_content(&self, prompt: &str, file: MediaPayload) -> Result<String> {
        let input = ToolInput::from_prompt(prompt).with_attachment(file);
        match self.run_to_output(ToolKind::Analysis, input, CancellationToken::new()).await? {
            ToolOutput::Text(text) => Ok(text),
            _ => Err(OracleError::generation("Analysis failed.")),
        }
    }

    async fn run_to_output(
        &self,
        kind: ToolKind,
        input: ToolInput,
        cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        let (tool, ctx) = self.tool_context(kind, cancel)?;
        self.executor.execute_output(tool, input, ctx).await
    }

    /// Synthesize speech for a message, markup reduced to display names
    pub async fn speak(&self, text: &str) -> Result<AudioClip> {
        let spoken = markup::strip_for_speech(text);
        if spoken.trim().is_empty() {
            return Err(OracleError::invalid_input("Nothing to read aloud."));
        }
        let models = &self.settings.models;
        let mut request =
            ContentRequest::new(models.speech_model.clone(), vec![ContentPart::Text(spoken)]);
        request.speech_voice = Some(models.speech_voice.clone());

        let credential = self.credentials.credential()?;
        let envelope = self.backend.generate_content(&credential, &request).await?;
        normalizer::audio_clip(&envelope)
    }

    /// Attach speech to a message. Failures are logged and leave the message as is.
    pub async fn speak_message(&self, conversation: &mut Conversation, id: Uuid) -> bool {
        let Some(text) = conversation.get(id).map(|m| m.text.clone()) else {
            return false;
        };
        match self.speak(&text).await {
            Ok(clip) => conversation.attach_audio(id, clip),
            Err(e) => {
                warn!(error = %e, "speech synthesis failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{text, MissingCredentials, RotatingCredentials, ScriptedBackend};
    use providers::{BackendTool, Citation, ResponseEnvelope};
    use shared::agent_api::{Role, Source, TopicCategory};
    use shared::credentials::StaticCredential;

    fn host(backend: Arc<ScriptedBackend>) -> OracleHost {
        OracleHost::new(
            backend,
            Arc::new(StaticCredential::new("key")),
            AppSettings::default(),
        )
        .with_media_store(MediaStore::new(std::env::temp_dir()))
    }

    #[tokio::test]
    async fn test_markup_answer_is_kept_verbatim() {
        let backend = Arc::new(ScriptedBackend::new());
        let answer = "Use the [[Abyssal whip|Slash: +82]] at [[Slayer Tower|Morytania]].";
        backend.push_chat(Ok(text(answer)));
        let host = host(backend.clone());
        let mut conversation = Conversation::with_greeting();

        let reply = host
            .submit_chat(&mut conversation, "Best slayer weapon?", &RequestConfig::default())
            .await
            .unwrap();
        assert_eq!(reply.text, answer);
        assert_eq!(reply.role, Role::Assistant);

        let items: Vec<_> = markup::parse(&conversation.messages()[2].text)
            .filter_map(|segment| match segment {
                markup::Segment::Item(item) => Some(item.display_name),
                markup::Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(items, vec!["Abyssal whip", "Slayer Tower"]);
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_search_turn_scopes_prompt_to_wiki() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Ok(ResponseEnvelope::TextWithCitations {
            text: Some("Kill Zulrah.".into()),
            citations: vec![
                Citation::Web(Source {
                    title: "Zulrah".into(),
                    uri: "https://oldschool.runescape.wiki/w/Zulrah".into(),
                }),
                Citation::Other { title: None },
            ],
        }));
        let host = host(backend.clone());
        let mut conversation = Conversation::new();
        let config = RequestConfig {
            topic_category: TopicCategory::CombatPvE,
            ..RequestConfig::default()
        };

        let reply = host
            .submit_chat(&mut conversation, "Money making?", &config)
            .await
            .unwrap();
        assert_eq!(reply.sources.len(), 1);

        let request = &backend.chat_requests()[0];
        assert_eq!(request.message, "Money making? site:oldschool.runescape.wiki");
        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.tools, vec![BackendTool::WebSearch]);
        assert!(request.system_instruction.contains("PvM"));
    }

    #[tokio::test]
    async fn test_reasoning_turn_sends_full_history() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Ok(text("first")));
        backend.push_chat(Ok(text("second")));
        let host = host(backend.clone());
        let mut conversation = Conversation::with_greeting();
        let config = RequestConfig {
            extended_reasoning_enabled: true,
            ..RequestConfig::default()
        };

        host.submit_chat(&mut conversation, "one", &config).await.unwrap();
        host.submit_chat(&mut conversation, "two", &config).await.unwrap();

        let requests = backend.chat_requests();
        assert_eq!(requests[0].history.len(), 1);
        assert_eq!(requests[1].history.len(), 3);
        assert_eq!(requests[1].message, "two");
        assert_eq!(requests[1].reasoning_budget, Some(32768));
        assert!(requests[1].tools.is_empty());
        assert_eq!(conversation.len(), 5);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_apology() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Err(OracleError::network("connection reset")));
        let host = host(backend);
        let mut conversation = Conversation::new();

        let reply = host
            .submit_chat(&mut conversation, "hello", &RequestConfig::default())
            .await
            .unwrap();
        assert_eq!(reply.text, prompts::CHAT_FAILURE);
        assert_eq!(conversation.len(), 2);
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_missing_credential_is_auth_error() {
        let backend = Arc::new(ScriptedBackend::new());
        let host = OracleHost::new(backend.clone(), Arc::new(MissingCredentials), AppSettings::default());
        let mut conversation = Conversation::new();
        let turn = conversation.begin_turn("hello").unwrap();

        let err = host.chat_turn(&turn, &RequestConfig::default()).await.unwrap_err();
        assert!(matches!(err, OracleError::Authentication { .. }));
        assert!(backend.chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_image_without_credential_keeps_auth_error() {
        let backend = Arc::new(ScriptedBackend::new());
        let host = OracleHost::new(backend.clone(), Arc::new(MissingCredentials), AppSettings::default());

        let err = host
            .generate_image(ToolInput::from_prompt("a castle"))
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Authentication { .. }));
        assert_eq!(err.to_string(), "Authentication failed: GEMINI_API_KEY not set");
        assert!(backend.content_requests().is_empty());
    }

    #[tokio::test]
    async fn test_image_api_error_keeps_status() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_content(Err(OracleError::Api {
            status: 503,
            detail: "overloaded".into(),
        }));
        let host = host(backend);

        let err = host
            .generate_image(ToolInput::from_prompt("a castle"))
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_credential_queried_per_call() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Ok(text("a")));
        backend.push_chat(Ok(text("b")));
        let host = OracleHost::new(
            backend.clone(),
            Arc::new(RotatingCredentials::new()),
            AppSettings::default(),
        );
        let mut conversation = Conversation::new();
        let config = RequestConfig::default();

        host.submit_chat(&mut conversation, "one", &config).await.unwrap();
        host.submit_chat(&mut conversation, "two", &config).await.unwrap();
        assert_eq!(backend.seen_keys(), vec!["key-1".to_string(), "key-2".to_string()]);
    }

    #[tokio::test]
    async fn test_speech_strips_markup() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_content(Ok(ResponseEnvelope::Media {
            blobs: vec![MediaPayload {
                mime_type: "audio/pcm".into(),
                data: "UENN".into(),
            }],
            text: None,
        }));
        let host = host(backend.clone());
        let mut conversation = Conversation::new();
        let turn = conversation.begin_turn("Equip the [[Dragon dagger|Fast stab]]").unwrap();

        assert!(host.speak_message(&mut conversation, turn.user_message_id).await);
        let request = &backend.content_requests()[0];
        assert_eq!(request.prompt_text(), "Equip the Dragon dagger");
        assert_eq!(request.speech_voice.as_deref(), Some("Fenrir"));
        assert!(conversation.get(turn.user_message_id).unwrap().audio.is_some());
    }

    #[tokio::test]
    async fn test_speech_failure_leaves_message() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_content(Ok(text("no audio here")));
        let host = host(backend);
        let mut conversation = Conversation::with_greeting();
        let id = conversation.messages()[0].id;

        assert!(!host.speak_message(&mut conversation, id).await);
        assert!(conversation.get(id).unwrap().audio.is_none());
    }

    #[tokio::test]
    async fn test_analysis_through_host() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_content(Ok(text("A rune scimitar.")));
        let host = host(backend);
        let file = MediaPayload {
            mime_type: "image/png".into(),
            data: "UE5H".into(),
        };

        let answer = host.analyze_content("", file).await.unwrap();
        assert_eq!(answer, "A rune scimitar.");
    }
}
