//! # PostClaw — Telegram in, Instagram out
//!
//! Collects media, a caption and a time from Telegram users, then publishes
//! to Instagram when the time comes.
//!
//! Usage:
//!   postclaw                         # Config from ~/.postclaw/config.toml + env
//!   postclaw --config ./prod.toml    # Explicit config file
//!   postclaw --port 8080 --verbose   # Override status port, debug logging

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use postclaw_bot::{Conversation, SessionStore};
use postclaw_channels::TelegramChannel;
use postclaw_core::config::PostClawConfig;
use postclaw_core::traits::{MessagingGateway, ObjectStore, PublishTarget};
use postclaw_gateway::AppState;
use postclaw_providers::{CloudinaryStore, InstagramTarget};
use postclaw_scheduler::{DispatchEngine, ItemStore, Publisher, Shutdown};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "postclaw",
    version,
    about = "📅 PostClaw — scheduled Instagram posts from Telegram"
)]
struct Cli {
    /// Config file (defaults to $POSTCLAW_CONFIG, then ~/.postclaw/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Status server port (overrides config and $PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(cli: &Cli) -> Result<PostClawConfig> {
    let explicit = cli
        .config
        .clone()
        .or_else(|| std::env::var("POSTCLAW_CONFIG").ok());

    let mut config = match explicit {
        Some(path) => {
            let path = expand_path(&path);
            PostClawConfig::load_from(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => PostClawConfig::load()?,
    };
    config.apply_env();
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Drive `work` unless `signal` completes first.
async fn interruptible<T, S>(
    work: impl Future<Output = T>,
    signal: &mut S,
) -> std::result::Result<T, S::Output>
where
    S: Future + Unpin,
{
    tokio::select! {
        biased;
        out = signal => Err(out),
        value = work => Ok(value),
    }
}

fn log_signal(signal: std::io::Result<()>) {
    match signal {
        Ok(()) => tracing::info!("🛑 Shutdown requested"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // `postclaw` prefixes every workspace crate's target.
    let filter = if cli.verbose {
        "postclaw=debug,tower_http=debug"
    } else {
        "postclaw=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    tracing::info!("📅 PostClaw v{}", env!("CARGO_PKG_VERSION"));

    let (trigger, shutdown) = Shutdown::new();

    // Collaborators
    let telegram = Arc::new(TelegramChannel::new(config.telegram.clone()));
    match telegram.get_me().await {
        Ok(me) => tracing::info!(
            "Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        ),
        Err(e) => tracing::warn!("⚠️ Could not fetch bot info: {e}"),
    }
    let gateway: Arc<dyn MessagingGateway> = telegram.clone();
    let media_store: Arc<dyn ObjectStore> =
        Arc::new(CloudinaryStore::new(config.cloudinary.clone()));
    let target: Arc<dyn PublishTarget> =
        Arc::new(InstagramTarget::new(config.instagram.clone(), &config.publish));

    // Shared state
    let items = Arc::new(ItemStore::new());
    let sessions = Arc::new(SessionStore::new());

    // Dispatch loop
    let publisher = Arc::new(Publisher::new(target, &config.publish, shutdown.clone()));
    let engine = DispatchEngine::new(
        items.clone(),
        publisher,
        gateway.clone(),
        &config.scheduler,
        shutdown.clone(),
    );
    let engine_task = tokio::spawn(engine.run());

    // Status server
    let gateway_config = config.gateway.clone();
    let state = AppState::new(items.clone(), sessions.clone());
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = postclaw_gateway::start(&gateway_config, state, server_shutdown).await {
            tracing::error!("❌ Status server failed: {e}");
        }
    });

    // Conversation: events are handled one at a time, in arrival order.
    let conversation = Conversation::new(
        gateway,
        media_store,
        items,
        sessions,
        config.intake.clone(),
    );
    let mut events = telegram.start_polling();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let event = match interruptible(events.next(), &mut ctrl_c).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::warn!("Telegram event stream ended");
                break;
            }
            Err(signal) => {
                log_signal(signal);
                break;
            }
        };
        // A long download or upload must not hold off Ctrl-C.
        if let Err(signal) = interruptible(conversation.handle(event), &mut ctrl_c).await {
            log_signal(signal);
            break;
        }
    }
    drop(events);
    trigger.trigger();

    let _ = engine_task.await;
    let _ = server_task.await;
    tracing::info!("👋 PostClaw stopped");
    Ok(())
}
