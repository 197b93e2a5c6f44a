// Echo relay: relay endpoint server and file-driven capture pipeline
//
// Usage:
//   echo-relay serve --port 3000
//   echo-relay capture --wav meeting.wav --seconds 10
//
// `serve` runs the relay socket and the static site on one listener.
// `capture` runs the extension side (coordinator, offscreen recorder,
// relay client, overlay) with a WAV file standing in for tab audio.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echo_relay::audio::{AudioFile, FileMediaDevices, NullPlayback};
use echo_relay::coordinator::{CoordinatorConfig, RecordingCoordinator, SessionPhase};
use echo_relay::http::{create_router, AppState, StatusReplyProcessor};
use echo_relay::overlay::Overlay;
use echo_relay::platform::{OverlayMessenger, Platform, StaticTab, TabId};
use echo_relay::relay::WsRelayConnector;
use echo_relay::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echo-relay")]
#[command(about = "Tab audio capture and relay")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/echo-relay", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay endpoint and the static site
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,

        /// Port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Stream a WAV file through the capture pipeline to a relay
    Capture {
        /// 16-bit PCM WAV file used as tab audio
        #[arg(short, long)]
        wav: PathBuf,

        /// Relay socket URL
        #[arg(short, long)]
        relay_url: Option<String>,

        /// Seconds to record before toggling off
        #[arg(short, long, default_value = "10")]
        seconds: u64,

        /// Restart the file when it ends
        #[arg(long)]
        looped: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("echo_relay=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;

    info!("Echo relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match args.command {
        Command::Serve { bind, port } => {
            if let Some(bind) = bind {
                cfg.service.http.bind = bind;
            }
            if let Some(port) = port {
                cfg.service.http.port = port;
            }
            serve(cfg).await
        }
        Command::Capture {
            wav,
            relay_url,
            seconds,
            looped,
        } => {
            if let Some(url) = relay_url {
                cfg.extension.relay_url = url;
            }
            capture(cfg, wav, Duration::from_secs(seconds), looped).await
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let processor = Arc::new(StatusReplyProcessor::new(cfg.relay.reply_text.clone()));
    let state = AppState::new(processor);
    let app = create_router(state, &cfg.relay.path, &cfg.site.root);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Relay endpoint listening on ws://{}{}", addr, cfg.relay.path);
    info!("Serving site from {}", cfg.site.root.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn capture(cfg: Config, wav: PathBuf, duration: Duration, looped: bool) -> Result<()> {
    let audio = AudioFile::open(&wav)?;
    info!(
        "Capturing {} ({:.1}s, {}Hz, {} channels)",
        wav.display(),
        audio.duration_seconds,
        audio.sample_rate,
        audio.channels
    );

    let messenger = OverlayMessenger::new(Overlay::mounted());
    let overlay = messenger.overlay();

    let platform = Platform {
        tabs: Arc::new(StaticTab::new(TabId(1))),
        messenger: Arc::new(messenger),
        media: Arc::new(FileMediaDevices::new(
            audio,
            cfg.extension.capture_frame_ms,
            looped,
        )),
        playback: Arc::new(NullPlayback),
        relay: Arc::new(WsRelayConnector::new(cfg.extension.relay_send_queue)),
    };

    let coord_config = CoordinatorConfig::from(&cfg.extension);
    let stop_wait = coord_config.stop_timeout + Duration::from_secs(1);

    let coordinator = RecordingCoordinator::new(coord_config, platform);
    let handle = coordinator.handle();
    let event_loop = tokio::spawn(coordinator.run());

    handle.toggle().await;
    let started = handle
        .wait_for(Duration::from_secs(10), |s| {
            s.phase == SessionPhase::Active || (s.phase == SessionPhase::Idle && s.last_error.is_some())
        })
        .await;

    match started {
        Some(status) if status.phase == SessionPhase::Active => {
            info!("Recording for {} seconds", duration.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping early"),
            }

            handle.toggle().await;
            match handle
                .wait_for(stop_wait, |s| s.phase == SessionPhase::Idle)
                .await
            {
                Some(status) => info!(
                    "Recording complete: {} chunks forwarded, {} dropped",
                    status.chunks_forwarded, status.chunks_dropped
                ),
                None => warn!("Coordinator did not return to idle"),
            }
        }
        Some(status) => {
            if let Some(error) = status.last_error {
                warn!("Recording did not start: {}", error);
            }
        }
        None => warn!("Timed out waiting for the recording to start"),
    }

    if let Some(text) = overlay.lock().await.text() {
        info!("Last overlay text: {}", text);
    }

    let final_status = handle.status();
    handle.shutdown().await;
    event_loop.await.context("Coordinator task failed")?;

    if let Some(error) = final_status.last_error {
        anyhow::bail!("Capture failed: {}", error);
    }

    Ok(())
}
