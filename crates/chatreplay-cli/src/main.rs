//! Streams a live chat or replays a recorded transcript, printing one JSON
//! line per event on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chatreplay_core::observability::init_observability;
use chatreplay_core::prelude::*;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "chatreplay", version, about = "Chat event-stream consumer and replayer")]
struct Cli {
    /// Chat service base URL (overrides CHATREPLAY_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Directory holding `mock/` and `replay/` transcripts (overrides CHATREPLAY_REPLAY_DIR).
    #[arg(long, global = true)]
    replay_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a message to the live chat service.
    Chat {
        message: String,
        #[arg(long)]
        thread_id: Option<String>,
        /// Answer to a previous interrupt (`accepted`, `edit_plan`, ...).
        #[arg(long)]
        feedback: Option<String>,
        #[arg(long)]
        auto_accept: bool,
    },
    /// Replay a recorded transcript.
    Replay {
        /// Named mock fixture (`mock/<NAME>.txt`).
        #[arg(long)]
        fixture: Option<String>,
        /// Mock mode: the script follows `--feedback`.
        #[arg(long)]
        mock: bool,
        /// Recorded session id (`replay/<ID>.txt`).
        #[arg(long)]
        replay_id: Option<String>,
        /// URL query string carrying `mock` / `replay`, e.g. `?replay=demo`.
        #[arg(long, conflicts_with_all = ["fixture", "mock", "replay_id"])]
        query: Option<String>,
        #[arg(long)]
        feedback: Option<String>,
        /// Skip the recorded pacing.
        #[arg(long)]
        fast: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_observability();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("reading CHATREPLAY_* environment")?;
    if let Some(url) = cli.api_url {
        config = config.api_base_url(url);
    }
    if let Some(dir) = cli.replay_dir {
        config = config.replay_dir(dir);
    }
    let client = ChatClient::from_config(&config)?;

    let (message, params, fast) = match cli.command {
        Command::Chat {
            message,
            thread_id,
            feedback,
            auto_accept,
        } => {
            let mut params = ChatParams::default().auto_accepted_plan(auto_accept);
            if let Some(thread_id) = thread_id {
                params = params.thread_id(thread_id);
            }
            if let Some(feedback) = feedback {
                params = params.interrupt_feedback(feedback);
            }
            (message, params, false)
        }
        Command::Replay {
            fixture,
            mock,
            replay_id,
            query,
            feedback,
            fast,
        } => {
            let replay = match query {
                Some(query) => ReplayParams::from_query(&query)
                    .with_context(|| format!("query `{query}` has no mock or replay parameter"))?,
                None => ReplayParams {
                    fixture,
                    mock,
                    replay_id,
                },
            };
            let mut params = ChatParams::default().replay(replay);
            if let Some(feedback) = feedback {
                params = params.interrupt_feedback(feedback);
            }
            (String::new(), params, fast)
        }
    };

    let (abort, signal) = AbortHandle::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    let mut chat = client.stream(
        message,
        params,
        PlaybackConfig::default().fast_forward(fast).abort_signal(signal),
    );
    while let Some(event) = chat.next_event().await {
        println!("{}", serde_json::to_string(&event)?);
    }

    match chat.state() {
        StreamState::Errored => match chat.error() {
            Some(err) => bail!("stream failed: {err}"),
            None => bail!("stream failed"),
        },
        StreamState::Cancelled => info!(events = chat.yielded(), "stream cancelled"),
        _ => info!(events = chat.yielded(), "stream completed"),
    }
    Ok(())
}
