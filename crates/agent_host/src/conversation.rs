//! In-memory conversation log for the active session.
//!
//! The log owns every [`Message`]. History sent to the backend is rebuilt from
//! it on each turn; nothing is persisted.

use shared::agent_api::{AudioClip, ConversationTurn, Message};
use shared::{OracleError, Result};
use uuid::Uuid;

use crate::prompts::GREETING;

/// Map prior messages to backend turns, one turn per message, raw text kept.
pub fn to_turns(messages: &[Message]) -> Vec<ConversationTurn> {
    messages
        .iter()
        .map(|m| ConversationTurn {
            role: m.role,
            parts: vec![m.text.clone()],
        })
        .collect()
}

/// A submitted user turn awaiting its answer
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub user_message_id: Uuid,
    pub text: String,
    /// Every message before the one being submitted
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    in_flight: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the Oracle's welcome line as the first assistant message
    pub fn with_greeting() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING, Vec::new())],
            in_flight: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn to_turns(&self) -> Vec<ConversationTurn> {
        to_turns(&self.messages)
    }

    /// Record the user's message and mark the conversation busy.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn> {
        if self.in_flight {
            return Err(OracleError::Busy);
        }
        if text.trim().is_empty() {
            return Err(OracleError::invalid_input("Type a question for the Oracle."));
        }

        let history = self.to_turns();
        let message = Message::user(text);
        let pending = PendingTurn {
            user_message_id: message.id,
            text: message.text.clone(),
            history,
        };
        self.messages.push(message);
        self.in_flight = true;
        Ok(pending)
    }

    /// Append the assistant reply and release the busy flag.
    pub fn finish_turn(&mut self, reply: Message) -> &Message {
        self.in_flight = false;
        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }

    /// Release the busy flag for a turn whose task was dropped
    pub fn abandon_turn(&mut self) {
        self.in_flight = false;
    }

    /// Attach synthesized speech to an existing message
    pub fn attach_audio(&mut self, id: Uuid, audio: AudioClip) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.audio = Some(audio);
                true
            }
            None => false,
        }
    }
}
