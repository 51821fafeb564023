//! chatlayout - Entry Point

use chatlayout::config::ResolvedConfig;
use chatlayout::model::{AppError, Message, SenderId};
use chatlayout::source::{demo_conversation, read_transcript};
use chatlayout::view::{self, layout};
use chatlayout::view_state::{
    CellMeasurer, ConversationView, LayoutContext, LayoutEngine, ScrollAnchor,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Terminal viewer for chat transcripts laid out as message bubbles
#[derive(Parser, Debug)]
#[command(name = "chatlayout")]
#[command(version)]
#[command(about = "Render a JSONL chat transcript as a scrollable bubble list")]
pub struct Args {
    /// Path to a JSONL transcript (shows a demo conversation if omitted)
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not follow the newest message
    #[arg(long)]
    pub no_auto_scroll: bool,

    /// Start with the typing indicator visible
    #[arg(long)]
    pub typing: bool,

    /// Sender id whose messages are drawn as outgoing
    #[arg(long, value_name = "ID")]
    pub local_sender: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    run(args)?;
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let config = resolve_config(&args)?;

    chatlayout::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let local_sender = SenderId::new(config.local_sender.clone())?;
    let messages = match &args.transcript {
        Some(path) => read_transcript(path)?,
        None => demo_conversation(&local_sender),
    };

    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut conversation = build_conversation(&config, local_sender, messages, width, height)?;
    if args.typing {
        conversation.set_typing(true);
    }

    view::run(conversation)
}

/// Defaults → Config File → Env Vars → CLI Args
fn resolve_config(args: &Args) -> Result<ResolvedConfig, AppError> {
    let config_file = chatlayout::config::load_config_with_precedence(args.config.clone())?;
    let merged = chatlayout::config::merge_config(config_file);
    let with_env = chatlayout::config::apply_env_overrides(merged);

    // Flags only override when explicitly set.
    let auto_scroll_override = args.no_auto_scroll.then_some(false);
    Ok(chatlayout::config::apply_cli_overrides(
        with_env,
        args.local_sender.clone(),
        auto_scroll_override,
    ))
}

fn build_conversation(
    config: &ResolvedConfig,
    local_sender: SenderId,
    messages: Vec<Message>,
    width: u16,
    height: u16,
) -> Result<ConversationView<CellMeasurer>, AppError> {
    let context = LayoutContext::new(width.max(1), config.layout.clone())?;
    let engine = LayoutEngine::new(CellMeasurer, local_sender, context, config.cache);
    let anchor = ScrollAnchor::new(config.auto_scroll, config.scroll.epsilon);
    let viewport_height = usize::from(layout::list_height(height));

    let mut conversation = ConversationView::new(engine, anchor, viewport_height);
    conversation.load(messages);
    Ok(conversation)
}
