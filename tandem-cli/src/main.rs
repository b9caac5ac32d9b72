use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tandem::RoomId;
use tandem::client::{
    LoggingSink, PeerEngine, SessionEvent, StaticTrackSource, TransportConfig,
    TurnServer, WebRtcFactory, WsSignaling,
};
use tandem::server::{DEFAULT_BIND_ADDR, ServerConfig};
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SIGNAL_QUEUE: usize = 64;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Two-party WebRTC rooms over a WebSocket coordinator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling coordinator.
    Serve {
        #[arg(long, env = "TANDEM_BIND", default_value = DEFAULT_BIND_ADDR)]
        bind: SocketAddr,
    },

    /// Join a room and negotiate with whoever else is in it.
    Join {
        #[arg(long, env = "TANDEM_URL", default_value = "ws://127.0.0.1:3000/ws")]
        url: String,

        /// Prompted for when absent.
        #[arg(long, env = "TANDEM_ROOM")]
        room: Option<String>,

        #[arg(long, env = "TANDEM_TURN_URL")]
        turn_url: Option<String>,

        #[arg(long, env = "TANDEM_TURN_USERNAME", requires = "turn_url")]
        turn_username: Option<String>,

        #[arg(long, env = "TANDEM_TURN_CREDENTIAL", requires = "turn_url")]
        turn_credential: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Join {
            url,
            room,
            turn_url,
            turn_username,
            turn_credential,
        } => {
            let room = match room {
                Some(room) => room,
                None => Input::<String>::new()
                    .with_prompt("Room")
                    .interact_text()
                    .context("Failed to read room id")?,
            };
            let room = RoomId::new(room);
            room.validate().context("Invalid room id")?;

            let config = TransportConfig {
                turn: turn_url.map(|url| TurnServer {
                    url,
                    username: turn_username,
                    credential: turn_credential,
                }),
                ..Default::default()
            };

            join(&url, room, config).await
        }
    }
}

async fn serve(bind: SocketAddr) -> Result<()> {
    println!("{}", "Starting tandem coordinator...".green().bold());
    println!("   Listening on ws://{}/ws", bind);

    tandem::server::serve(ServerConfig { bind_addr: bind })
        .await
        .with_context(|| format!("Coordinator on {} stopped", bind))
}

async fn join(url: &str, room: RoomId, config: TransportConfig) -> Result<()> {
    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE);
    let signaling = WsSignaling::connect(url, signal_tx)
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;

    let factory = WebRtcFactory::new(config).context("Failed to set up WebRTC")?;
    let (source, _video) = StaticTrackSource::vp8("tandem");

    let (engine, handle) = PeerEngine::new(
        factory,
        &source,
        Arc::new(LoggingSink),
        Arc::new(signaling.clone()),
        signal_rx,
    );
    let mut events = handle.subscribe();
    let mut engine_task = tokio::spawn(engine.run());

    println!("{} {}", "Joining room".cyan(), room.as_str().bold());
    handle.join(room).await;

    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    match follow_session(&mut events, &mut engine_task, interrupt).await {
        Ending::Interrupted => {
            println!("{}", "Leaving...".yellow());
            handle.leave().await;
            engine_task.await.context("Engine task panicked")?;
        }
        Ending::EngineStopped(result) => {
            result.context("Engine task panicked")?;
            println!("{}", "Signaling connection lost".red());
        }
    }
    signaling.close();
    info!("Bye");
    Ok(())
}

#[derive(Debug)]
enum Ending {
    Interrupted,
    EngineStopped(std::result::Result<(), JoinError>),
}

/// Prints session events until the user interrupts or the engine stops on its
/// own. The engine task is only awaited here when it has already finished.
async fn follow_session(
    events: &mut broadcast::Receiver<SessionEvent>,
    engine_task: &mut JoinHandle<()>,
    interrupt: impl Future<Output = ()>,
) -> Ending {
    tokio::select! {
        result = &mut *engine_task => Ending::EngineStopped(result),
        _ = interrupt => Ending::Interrupted,
        _ = print_events(events) => Ending::EngineStopped(engine_task.await),
    }
}

async fn print_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                println!("{}", format!("({} events skipped)", n).dimmed());
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Welcomed { local } => {
            println!("{} {}", "Connected as".green(), local);
        }
        SessionEvent::RoomFull { room } => {
            println!("{}", format!("Room '{}' is full", room).red().bold());
        }
        SessionEvent::SessionCreated { remote, role } => {
            println!("{} {} ({})", "Peer".cyan(), remote, role);
        }
        SessionEvent::SessionSetupFailed { remote, reason } => {
            println!("{} {}: {}", "Setup failed for".red(), remote, reason);
        }
        SessionEvent::StateChanged { remote, state } => {
            println!("   {} -> {}", remote, state.to_string().bold());
        }
        SessionEvent::NegotiationFailed {
            remote,
            state,
            reason,
        } => {
            println!(
                "{} {} in {}: {}",
                "Negotiation failed with".red(),
                remote,
                state,
                reason
            );
        }
        SessionEvent::SessionEnded { remote, state } => {
            println!("{} {} ({})", "Session ended with".yellow(), remote, state);
        }
    }
}
