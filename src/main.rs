use anyhow::{bail, Context, Result};
use base64::Engine as _;
use clap::Parser;
use gemini_relay::ai::mime::detect_batch_mime;
use gemini_relay::ai::{ReqwestTransport, RequestPipeline};
use gemini_relay::models::{ApiSettings, Message, PipelineOptions, Role};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Clarify a request and send it to Gemini")]
struct CliArgs {
    /// User request text.
    #[arg(short, long, required_unless_present = "conversation")]
    prompt: Option<String>,

    /// Optional system instruction.
    #[arg(short, long)]
    system: Option<String>,

    /// Image file attached to the user turn. May be repeated.
    #[arg(short, long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,

    /// JSON file holding the whole conversation; replaces --prompt/--system.
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["prompt", "system"])]
    conversation: Option<PathBuf>,

    /// MIME type for attached images; sniffed from the first image if omitted.
    #[arg(long)]
    mime_type: Option<String>,
}

fn load_conversation(path: &Path) -> Result<Vec<Message>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conversation file {}", path.display()))?;
    let messages: Vec<Message> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid conversation JSON in {}", path.display()))?;
    if messages.is_empty() {
        bail!("Conversation file {} holds no messages", path.display());
    }
    Ok(messages)
}

fn build_conversation(args: &CliArgs, images: Vec<String>) -> Result<Vec<Message>> {
    let mut messages = match &args.conversation {
        Some(path) => load_conversation(path)?,
        None => {
            let mut messages = Vec::new();
            if let Some(system) = &args.system {
                messages.push(Message::system(system.clone()));
            }
            messages.push(Message::user(args.prompt.clone().unwrap_or_default()));
            messages
        }
    };

    if !images.is_empty() {
        match messages.iter_mut().rev().find(|m| m.role == Role::User) {
            Some(message) => message.images.extend(images),
            None => bail!("Images given but the conversation has no user message"),
        }
    }
    Ok(messages)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let image_bytes = args
        .images
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let mime_type = args
        .mime_type
        .clone()
        .unwrap_or_else(|| detect_batch_mime(&image_bytes).to_string());
    let encoded = image_bytes
        .iter()
        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
        .collect();

    let conversation = build_conversation(&args, encoded)?;
    let settings = ApiSettings::from_env()?;
    let pipeline = RequestPipeline::new(
        Box::new(ReqwestTransport::new()),
        PipelineOptions::from_env(),
    );

    info!(
        "Sending {} message(s) via {} method",
        conversation.len(),
        settings.method
    );

    match pipeline.send(&settings, &conversation, &mime_type).await {
        Ok(outcome) => {
            println!("{}", outcome);
            Ok(())
        }
        Err(e) => {
            error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
