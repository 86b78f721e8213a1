mod chat;
mod config;

use agent_host::media::{decode_data_uri, load_file};
use agent_host::OracleHost;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use providers::GeminiClient;
use shared::agent_api::TopicCategory;
use shared::credentials::SettingsCredentials;
use shared::events::ToolEvent;
use shared::settings::AppSettings;
use shared::tool::{AspectRatio, ExecutionStatus, ImageSize, ToolInput, ToolKind, ToolOutput};
use shared::OracleError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "oracle", version, about = "Old School RuneScape guide assistant")]
struct Cli {
    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the Oracle questions interactively
    Chat(ChatArgs),
    /// Generate concept art
    Image(ImageArgs),
    /// Edit an existing image
    Edit(EditArgs),
    /// Animate a prompt, optionally from a starting image
    Video(VideoArgs),
    /// Describe a screenshot or clip
    Analyze(AnalyzeArgs),
    /// Read text aloud
    Speak(SpeakArgs),
    /// Store an API key in the settings file
    Login(LoginArgs),
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    no_search: bool,
    #[arg(long)]
    think: bool,
    #[arg(long, value_parser = parse_category)]
    category: Option<TopicCategory>,
}

#[derive(Debug, Parser)]
struct ImageArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "1K", value_parser = parse_size)]
    size: ImageSize,
    #[arg(long, default_value = "oracle-image.png")]
    out: PathBuf,
}

#[derive(Debug, Parser)]
struct EditArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "oracle-edit.png")]
    out: PathBuf,
}

#[derive(Debug, Parser)]
struct VideoArgs {
    #[arg(long)]
    prompt: String,
    /// Starting frame
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value = "16:9", value_parser = parse_ratio)]
    aspect: AspectRatio,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    file: PathBuf,
    #[arg(long, default_value = "")]
    prompt: String,
    /// Override the media type guessed from the extension
    #[arg(long)]
    mime_type: Option<String>,
}

#[derive(Debug, Parser)]
struct SpeakArgs {
    text: String,
}

#[derive(Debug, Parser)]
struct LoginArgs {
    api_key: String,
}

fn parse_category(value: &str) -> Result<TopicCategory, String> {
    TopicCategory::parse(value).ok_or_else(|| format!("unknown category: {}", value))
}

fn parse_size(value: &str) -> Result<ImageSize, String> {
    ImageSize::parse(value).ok_or_else(|| "expected 1K, 2K or 4K".to_string())
}

fn parse_ratio(value: &str) -> Result<AspectRatio, String> {
    AspectRatio::parse(value).ok_or_else(|| "expected 16:9 or 9:16".to_string())
}

fn friendly(err: OracleError) -> anyhow::Error {
    anyhow!(err.user_message())
}

fn build_host(settings: AppSettings) -> Result<OracleHost> {
    let client = GeminiClient::new(settings.gemini.api_base.clone()).map_err(friendly)?;
    let credentials = SettingsCredentials::new(settings.gemini.auth.clone());
    Ok(OracleHost::new(Arc::new(client), Arc::new(credentials), settings))
}

async fn write_data_uri(uri: &str, out: &Path) -> Result<()> {
    let (mime_type, bytes) = decode_data_uri(uri).map_err(friendly)?;
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Saved {} ({} bytes) to {}", mime_type, bytes.len(), out.display());
    Ok(())
}

async fn run_video(settings: AppSettings, args: VideoArgs) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let host = build_host(settings)?.with_events(tx);

    let mut input = ToolInput::from_prompt(args.prompt).with_aspect_ratio(args.aspect);
    if let Some(path) = &args.image {
        input = input.with_attachment(load_file(path, None).await.map_err(friendly)?);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let ToolEvent::Progress { message, attempt, .. } = event {
                println!("{} (check {})", message, attempt.unwrap_or_default());
            }
        }
    });

    println!("Generating video (this may take a minute or two)...");
    let execution = host
        .run_tool(ToolKind::VideoGeneration, input, cancel)
        .await
        .map_err(friendly)?;
    drop(host);
    let _ = progress.await;

    match (execution.status, execution.output) {
        (ExecutionStatus::Completed, Some(ToolOutput::Video(handle))) => {
            println!("Video saved to {}", handle.path.display());
            Ok(())
        }
        _ => Err(anyhow!(execution
            .error
            .unwrap_or_else(|| "Video generation failed".to_string()))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings_path = cli.settings.clone().or_else(config::config_path);
    let settings = config::load_settings_or_default(settings_path.as_deref());

    match cli.command {
        Command::Chat(args) => {
            let mut chat_config = settings.chat_defaults;
            if args.no_search {
                chat_config.search_enabled = false;
            }
            if args.think {
                chat_config.extended_reasoning_enabled = true;
            }
            if let Some(category) = args.category {
                chat_config.topic_category = category;
            }
            let host = build_host(settings)?;
            chat::run(&host, chat_config).await
        }
        Command::Image(args) => {
            let host = build_host(settings)?;
            let input = ToolInput::from_prompt(args.prompt).with_image_size(args.size);
            let uri = host.generate_image(input).await.map_err(friendly)?;
            write_data_uri(&uri, &args.out).await
        }
        Command::Edit(args) => {
            let host = build_host(settings)?;
            let image = load_file(&args.image, None).await.map_err(friendly)?;
            let uri = host.edit_image(&args.prompt, image).await.map_err(friendly)?;
            write_data_uri(&uri, &args.out).await
        }
        Command::Video(args) => run_video(settings, args).await,
        Command::Analyze(args) => {
            let host = build_host(settings)?;
            let file = load_file(&args.file, args.mime_type.as_deref())
                .await
                .map_err(friendly)?;
            let text = host.analyze_content(&args.prompt, file).await.map_err(friendly)?;
            println!("{}", agent_host::markup::render_plain(&text));
            Ok(())
        }
        Command::Speak(args) => {
            let host = build_host(settings)?;
            let clip = host.speak(&args.text).await.map_err(friendly)?;
            let bytes = {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD
                    .decode(clip.data.as_bytes())
                    .context("decoding audio")?
            };
            let handle = host
                .media_store()
                .store(&bytes, &clip.mime_type)
                .await
                .map_err(friendly)?;
            println!("Audio ({}) saved to {}", clip.mime_type, handle.path.display());
            Ok(())
        }
        Command::Login(args) => {
            let path = settings_path.ok_or_else(|| anyhow!("no config directory available"))?;
            let mut settings = settings;
            settings.gemini.auth.api_key = Some(args.api_key.trim().to_string());
            config::save_settings(&path, &settings)?;
            println!("API key saved to {}", path.display());
            Ok(())
        }
    }
}
