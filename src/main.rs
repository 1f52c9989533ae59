//! Mission Control - operator dashboard server for autonomous agent sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mission_control::client::{EventStreamClient, StreamChannel, DEFAULT_RECONNECT_DELAY};
use mission_control::config::ConfigLoader;
use mission_control::display;
use mission_control::hub::BroadcastHub;
use mission_control::server::{AppState, DashboardServer};
use mission_control::tasks::TaskStore;
use mission_control::watcher::{
    FileChangeEvent, LogEvent, SessionRotationMonitor, WorkspaceWatcher,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChannelArg {
    Logs,
    Files,
}

impl From<ChannelArg> for StreamChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Logs => StreamChannel::Logs,
            ChannelArg::Files => StreamChannel::Files,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "mission-control",
    about = "Operator dashboard server for autonomous agent sessions",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard server.
    Serve {
        /// Path to a config file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,
        /// Directory containing agent session logs.
        #[arg(long)]
        sessions_dir: Option<PathBuf>,
        /// Workspace directory to watch for file changes.
        #[arg(long)]
        workspace_dir: Option<PathBuf>,
    },
    /// Stream events from a running server to the terminal.
    Tail {
        /// Server base URL.
        #[arg(long, default_value = "ws://127.0.0.1:3001")]
        url: String,
        /// Channel to subscribe to.
        #[arg(long, value_enum, default_value_t = ChannelArg::Logs)]
        channel: ChannelArg,
        /// Seconds to wait between reconnection attempts.
        #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY.as_secs())]
        reconnect_secs: u64,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            sessions_dir,
            workspace_dir,
        } => run_serve(config, host, port, sessions_dir, workspace_dir).await,
        Commands::Tail {
            url,
            channel,
            reconnect_secs,
        } => run_tail(&url, channel, reconnect_secs).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    sessions_dir: Option<PathBuf>,
    workspace_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = config_path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = sessions_dir {
        config.sessions.dir = dir;
    }
    if let Some(dir) = workspace_dir {
        config.workspace.dir = dir;
    }
    let config = Arc::new(config);

    let log_hub = Arc::new(BroadcastHub::new("logs"));
    let file_hub = Arc::new(BroadcastHub::new("files"));
    let cancel = CancellationToken::new();
    let tasks = Arc::new(TaskStore::open(&config.tasks.file).await?);

    let monitor = SessionRotationMonitor::new(
        config.sessions.dir.clone(),
        Duration::from_secs(config.sessions.rotation_interval_secs),
        log_hub.clone(),
        cancel.clone(),
    );
    let monitor_handle = monitor.spawn();

    let workspace = WorkspaceWatcher::new(
        config.workspace.dir.clone(),
        config.workspace.max_depth,
        file_hub.clone(),
        cancel.clone(),
    );
    let workspace_handle = workspace.spawn();

    let state = AppState::new(config, log_hub, file_hub, tasks, cancel.clone());
    let server = DashboardServer::new(state);

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
    });

    let result = server.run().await;

    cancel.cancel();
    let _ = monitor_handle.await;
    let _ = workspace_handle.await;

    result.map_err(Into::into)
}

async fn run_tail(
    url: &str,
    channel: ChannelArg,
    reconnect_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let channel: StreamChannel = channel.into();
    let client = EventStreamClient::new(
        url,
        channel,
        Duration::from_secs(reconnect_secs),
        cancel,
    )?;

    client
        .run(move |frame| match channel {
            StreamChannel::Logs => match serde_json::from_str::<LogEvent>(frame) {
                Ok(event) => display::print_log_event(&event),
                Err(_) => display::print_raw(frame),
            },
            StreamChannel::Files => match serde_json::from_str::<FileChangeEvent>(frame) {
                Ok(event) => display::print_file_change(&event),
                Err(_) => display::print_raw(frame),
            },
        })
        .await;

    Ok(())
}
