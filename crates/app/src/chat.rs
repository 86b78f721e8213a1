//! Interactive chat loop on stdin/stdout.

use agent_host::markup::render_plain;
use agent_host::{Conversation, OracleHost};
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shared::agent_api::{Message, RequestConfig, Role, TopicCategory};
use shared::OracleError;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "/search  toggle wiki search\n/think   toggle extended reasoning\n/category <general|pvm|pvp|diaries|skilling>\n/speak   read the last answer aloud\n/quit";

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    ToggleSearch,
    ToggleReasoning,
    Category(Option<TopicCategory>),
    Speak,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };
    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    match name {
        "search" => Command::ToggleSearch,
        "think" => Command::ToggleReasoning,
        "category" => Command::Category(TopicCategory::parse(arg)),
        "speak" => Command::Speak,
        "quit" | "exit" => Command::Quit,
        _ => Command::Help,
    }
}

/// Apply a toggle. Search cannot be changed while extended reasoning is on.
pub fn apply_toggle(config: &mut RequestConfig, command: &Command) -> Option<String> {
    match command {
        Command::ToggleSearch => {
            if !config.search_editable() {
                return Some("Search is unavailable while extended reasoning is on.".into());
            }
            config.search_enabled = !config.search_enabled;
            Some(format!("Search {}", on_off(config.search_enabled)))
        }
        Command::ToggleReasoning => {
            config.extended_reasoning_enabled = !config.extended_reasoning_enabled;
            Some(format!(
                "Extended reasoning {}",
                on_off(config.extended_reasoning_enabled)
            ))
        }
        Command::Category(Some(category)) => {
            config.topic_category = *category;
            Some(format!("Category: {}", category.display_name()))
        }
        Command::Category(None) => Some("Unknown category.".into()),
        _ => None,
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn render_message(message: &Message) -> String {
    let mut out = render_plain(&message.text);
    if !message.sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in &message.sources {
            out.push_str(&format!("\n  - {} <{}>", source.title, source.uri));
        }
    }
    out
}

pub async fn run(host: &OracleHost, mut config: RequestConfig) -> Result<()> {
    let mut conversation = Conversation::with_greeting();
    if let Some(greeting) = conversation.messages().first() {
        println!("{}\n", render_message(greeting));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = parse_command(&line);
        match &command {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Ask(text) => {
                println!("{}", config.progress_hint());
                match host.submit_chat(&mut conversation, text, &config).await {
                    Ok(reply) => println!("\n{}\n", render_message(reply)),
                    Err(e) => println!("{}", e.user_message()),
                }
            }
            Command::Speak => speak_last(host, &mut conversation).await,
            _ => {
                if let Some(status) = apply_toggle(&mut config, &command) {
                    println!("{}", status);
                }
            }
        }
    }
    Ok(())
}

async fn speak_last(host: &OracleHost, conversation: &mut Conversation) {
    let Some(id) = conversation
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.id)
    else {
        return;
    };
    if !host.speak_message(conversation, id).await {
        println!("The Oracle cannot speak right now.");
        return;
    }
    let Some(clip) = conversation.get(id).and_then(|m| m.audio.clone()) else {
        return;
    };
    let saved = match STANDARD.decode(clip.data.as_bytes()) {
        Ok(bytes) => host
            .media_store()
            .store(&bytes, &clip.mime_type)
            .await,
        Err(e) => Err(OracleError::generation(format!("invalid audio payload: {}", e))),
    };
    match saved {
        Ok(handle) => println!("Audio ({}) saved to {}", handle.mime_type, handle.path.display()),
        Err(e) => println!("{}", e.user_message()),
    }
}
