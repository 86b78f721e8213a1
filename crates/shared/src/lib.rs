pub mod credentials;
pub mod error;
pub mod events;
pub mod tool;

pub use error::{OracleError, Result};

pub mod settings {
    use crate::agent_api::RequestConfig;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;
    use std::time::Duration;

    fn default_api_base() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }

    /// A bearer token obtained elsewhere. Refreshing it is the caller's job.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OAuthCredentials {
        pub access_token: String,
        #[serde(default)]
        pub expires_at: Option<i64>, // Unix timestamp
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
        pub oauth: Option<OAuthCredentials>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct GeminiSettings {
        #[serde(default = "default_api_base")]
        pub api_base: String,
        #[serde(default)]
        pub auth: ProviderAuth,
    }

    impl Default for GeminiSettings {
        fn default() -> Self {
            Self {
                api_base: default_api_base(),
                auth: ProviderAuth::default(),
            }
        }
    }

    /// Backend model identifiers for every request kind.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelCatalog {
        pub reasoning_model: String,  // e.g., "gemini-3-pro-preview"
        pub grounded_model: String,   // e.g., "gemini-2.5-flash"
        pub image_model: String,      // e.g., "gemini-3-pro-image-preview"
        pub image_edit_model: String, // e.g., "gemini-2.5-flash-image"
        pub video_model: String,      // e.g., "veo-3.1-fast-generate-preview"
        pub analysis_model: String,
        pub speech_model: String,
        pub speech_voice: String,
        pub max_reasoning_budget: u32,
        /// Appended to grounded-search prompts to scope results to the wiki
        pub search_domain: String,
    }

    impl Default for ModelCatalog {
        fn default() -> Self {
            Self {
                reasoning_model: "gemini-3-pro-preview".into(),
                grounded_model: "gemini-2.5-flash".into(),
                image_model: "gemini-3-pro-image-preview".into(),
                image_edit_model: "gemini-2.5-flash-image".into(),
                video_model: "veo-3.1-fast-generate-preview".into(),
                analysis_model: "gemini-3-pro-preview".into(),
                speech_model: "gemini-2.5-flash-preview-tts".into(),
                speech_voice: "Fenrir".into(),
                max_reasoning_budget: 32768,
                search_domain: "oldschool.runescape.wiki".into(),
            }
        }
    }

    /// Polling policy for long-running video jobs
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct VideoPollSettings {
        pub interval_secs: u64,
        /// None means poll until the backend reports done
        pub max_attempts: Option<u32>,
        pub deadline_secs: Option<u64>,
    }

    impl VideoPollSettings {
        pub fn interval(&self) -> Duration {
            Duration::from_secs(self.interval_secs)
        }

        pub fn deadline(&self) -> Option<Duration> {
            self.deadline_secs.map(Duration::from_secs)
        }
    }

    impl Default for VideoPollSettings {
        fn default() -> Self {
            Self {
                interval_secs: 5,
                max_attempts: Some(120),
                deadline_secs: None,
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub gemini: GeminiSettings,
        #[serde(default)]
        pub models: ModelCatalog,
        #[serde(default)]
        pub video: VideoPollSettings,
        /// Where generated videos are written; platform cache dir when unset
        #[serde(default)]
        pub media_dir: Option<PathBuf>,
        #[serde(default)]
        pub chat_defaults: RequestConfig,
    }
}

pub mod agent_api {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    impl Role {
        /// Role name on the wire. Gemini calls the assistant "model".
        pub fn wire_name(&self) -> &'static str {
            match self {
                Role::User => "user",
                Role::Assistant => "model",
            }
        }
    }

    /// Grounding citation attached to an assistant answer
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Source {
        pub title: String,
        pub uri: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AudioClip {
        pub mime_type: String,
        pub data: String, // base64
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Message {
        pub id: Uuid,
        pub role: Role,
        pub text: String,
        pub timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub sources: Vec<Source>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub audio: Option<AudioClip>,
    }

    impl Message {
        pub fn user(text: impl Into<String>) -> Self {
            Self::new(Role::User, text.into(), Vec::new())
        }

        pub fn assistant(text: impl Into<String>, sources: Vec<Source>) -> Self {
            Self::new(Role::Assistant, text.into(), sources)
        }

        fn new(role: Role, text: String, sources: Vec<Source>) -> Self {
            Self {
                id: Uuid::new_v4(),
                role,
                text,
                timestamp: Utc::now(),
                sources,
                audio: None,
            }
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum TopicCategory {
        #[default]
        General,
        #[serde(rename = "PvM")]
        CombatPvE,
        #[serde(rename = "PvP")]
        CombatPvP,
        Diaries,
        Skilling,
    }

    impl TopicCategory {
        pub fn all() -> &'static [TopicCategory] {
            &[
                TopicCategory::General,
                TopicCategory::CombatPvE,
                TopicCategory::CombatPvP,
                TopicCategory::Diaries,
                TopicCategory::Skilling,
            ]
        }

        /// Short label the model sees in its instructions
        pub fn label(&self) -> &'static str {
            match self {
                TopicCategory::General => "General",
                TopicCategory::CombatPvE => "PvM",
                TopicCategory::CombatPvP => "PvP",
                TopicCategory::Diaries => "Diaries",
                TopicCategory::Skilling => "Skilling",
            }
        }

        pub fn display_name(&self) -> &'static str {
            match self {
                TopicCategory::General => "General",
                TopicCategory::CombatPvE => "PvM & Bossing",
                TopicCategory::CombatPvP => "PvP & PKing",
                TopicCategory::Diaries => "Achievement Diaries",
                TopicCategory::Skilling => "Skilling",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim().to_ascii_lowercase().as_str() {
                "general" => Some(TopicCategory::General),
                "pvm" | "pve" | "combat-pve" => Some(TopicCategory::CombatPvE),
                "pvp" | "combat-pvp" => Some(TopicCategory::CombatPvP),
                "diaries" | "diary" => Some(TopicCategory::Diaries),
                "skilling" => Some(TopicCategory::Skilling),
                _ => None,
            }
        }
    }

    /// User-controlled chat toggles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RequestConfig {
        pub search_enabled: bool,
        pub extended_reasoning_enabled: bool,
        pub topic_category: TopicCategory,
    }

    impl RequestConfig {
        /// Search is not honored while extended reasoning is on
        pub fn search_editable(&self) -> bool {
            !self.extended_reasoning_enabled
        }

        pub fn progress_hint(&self) -> &'static str {
            if self.extended_reasoning_enabled {
                "Thinking deeply regarding your strategy..."
            } else {
                "Consulting the Wiki..."
            }
        }
    }

    impl Default for RequestConfig {
        fn default() -> Self {
            Self {
                search_enabled: true,
                extended_reasoning_enabled: false,
                topic_category: TopicCategory::General,
            }
        }
    }

    /// One prior message in the shape the backend expects
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConversationTurn {
        pub role: Role,
        pub parts: Vec<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::agent_api::*;
    use super::settings::AppSettings;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::User.wire_name(), "user");
        assert_eq!(Role::Assistant.wire_name(), "model");
    }

    #[test]
    fn test_category_round_trips_original_labels() {
        let json = serde_json::to_string(&TopicCategory::CombatPvE).unwrap();
        assert_eq!(json, "\"PvM\"");
        for category in TopicCategory::all() {
            assert_eq!(TopicCategory::parse(category.label()), Some(*category));
        }
    }

    #[test]
    fn test_request_config_hints() {
        let mut config = RequestConfig::default();
        assert!(config.search_enabled);
        assert!(config.search_editable());
        assert_eq!(config.progress_hint(), "Consulting the Wiki...");

        config.extended_reasoning_enabled = true;
        assert!(!config.search_editable());
        assert!(config.progress_hint().starts_with("Thinking deeply"));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"video": {"interval_secs": 2, "max_attempts": null, "deadline_secs": 30}}"#)
                .unwrap();
        assert_eq!(settings.video.interval_secs, 2);
        assert_eq!(settings.video.max_attempts, None);
        assert_eq!(settings.models.speech_voice, "Fenrir");
        assert!(settings.gemini.api_base.starts_with("https://"));
    }
}
