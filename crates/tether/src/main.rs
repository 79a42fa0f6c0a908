//! Tether engine entrypoint.
//!
//! Loads layered settings, opens the conversation store, wires the memory
//! engine into the transport, and runs until interrupted:
//! - front door: framed TCP push channel plus the read-only HTTP query API
//! - optionally, an outbound client link to a remote agent (`--agent`)

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tether_core::sink::ConversationSink;
use tether_door::{FrontDoor, FrontDoorConfig};
use tether_net::{AgentClient, ClientConfig, DEFAULT_MAX_FRAME_BYTES, Dispatcher};
use tether_settings::loader::load_layered;
use tether_settings::types::{Settings, default_root};
use tether_store::ConversationStore;
use tether_summary::{MemoryEngine, SummarizeClient};

#[derive(Debug, Parser)]
#[command(
    name = "tether",
    about = "Messaging and persistence engine for a remote embodied agent"
)]
struct Args {
    /// Override config file, deep-merged over the default root's config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage root override (default: storage.root setting, else ~/.config/tether).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Remote agent to maintain an outbound connection to, as host:port.
    #[arg(long)]
    agent: Option<String>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tether_core::logging::init(&args.log);

    let settings = load_layered(
        &default_root().join("config.toml"),
        args.config.as_deref(),
    )
    .context("failed to load settings")?;

    let root = args
        .root
        .clone()
        .or_else(|| settings.storage.root.clone())
        .unwrap_or_else(default_root);
    let store = Arc::new(ConversationStore::open(&root).context("failed to open store")?);

    let sink: Arc<dyn ConversationSink> = Arc::new(MemoryEngine::new(
        Arc::clone(&store),
        summarize_client(&settings),
        settings.conversation.memory_rounds,
    ));

    let dispatcher = Dispatcher::new()
        .on_motion(|args| info!(?args, "motion command"))
        .on_emotion(|args| info!(?args, "emotion command"))
        .on_generic(|name, args| info!(name, ?args, "generic command"));

    let door = FrontDoor::start(
        &FrontDoorConfig {
            push_addr: format!("0.0.0.0:{}", settings.server.port),
            http_addr: format!("0.0.0.0:{}", settings.server.http_port),
        },
        Arc::clone(&store),
        dispatcher.clone(),
        Some(Arc::clone(&sink)),
    )
    .await
    .context("failed to start front door")?;

    let client = match &args.agent {
        Some(addr) => Some(connect_agent(addr, &settings, dispatcher, sink).await?),
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    if let Some(client) = client {
        client.disconnect().await;
    }
    door.shutdown();
    Ok(())
}

/// Build the summarization client when the collaborator is configured.
fn summarize_client(settings: &Settings) -> Option<SummarizeClient> {
    if settings.api.host.is_empty() || settings.api.api_key.is_empty() {
        warn!("summarization collaborator not configured, memories disabled");
        return None;
    }
    let base = if settings.api.host.starts_with("http://") || settings.api.host.starts_with("https://") {
        settings.api.host.clone()
    } else {
        format!("https://{}", settings.api.host)
    };
    Some(SummarizeClient::new(base, settings.api.api_key.clone()))
}

/// Start the outbound agent link. A refused first connection is not fatal
/// when auto-reconnect is on: the retry loop keeps trying.
async fn connect_agent(
    addr: &str,
    settings: &Settings,
    dispatcher: Dispatcher,
    sink: Arc<dyn ConversationSink>,
) -> Result<AgentClient> {
    let (host, port) = addr
        .rsplit_once(':')
        .context("--agent expects host:port")?;
    let port: u16 = port.parse().context("--agent expects a numeric port")?;

    let client = AgentClient::new(
        ClientConfig {
            host: host.to_string(),
            port,
            reconnect_interval: Duration::from_millis(settings.server.reconnect_interval_ms),
            auto_reconnect: settings.server.auto_reconnect,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        },
        dispatcher,
        Some(sink),
    );
    if let Err(e) = client.connect().await {
        if settings.server.auto_reconnect {
            warn!(error = %e, "initial agent connection failed, retrying in background");
        } else {
            return Err(e).context("failed to connect to agent");
        }
    }
    Ok(client)
}
