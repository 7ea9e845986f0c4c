//! nyxa-ss - Review & Reward Self-Service microservice
//!
//! **Module Identity:**
//! - Name: nyxa-ss (Self-Service)
//! - Port: 5730
//!
//! Serves the "leave a review, get a reward" flow over HTTP + SSE, or checks
//! a single screenshot from the command line (`nyxa-ss verify <image>`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nyxa_common::config::{ConfigResolver, TomlConfig};
use nyxa_common::events::EventBus;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nyxa_ss::models::{reward_links, FlowStep, UploadedArtifact};
use nyxa_ss::services::{
    spawn_idle_sweeper, FlowController, ReviewClassifier, ScreenshotClassifier, TesseractCli,
    UploadOutcome, SWEEP_INTERVAL,
};
use nyxa_ss::{AppState, EVENT_BUS_CAPACITY};

const MODULE_NAME: &str = "nyxa-ss";

/// Command-line arguments for nyxa-ss
#[derive(Parser, Debug)]
#[command(name = "nyxa-ss")]
#[command(about = "Review & reward self-service microservice for Nyxa")]
#[command(version)]
struct Args {
    /// Configuration file (overrides NYXA_SS_CONFIG and the per-user file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Interface to bind (overrides the config file)
        #[arg(short, long, env = "NYXA_SS_BIND")]
        bind: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "NYXA_SS_PORT")]
        port: Option<u16>,
    },

    /// Run one screenshot through the flow and print the final snapshot
    Verify {
        /// Screenshot file (JPG, PNG or WebP)
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load config before tracing so the configured level applies; report
    // problems once the subscriber exists.
    let resolved = ConfigResolver::new(MODULE_NAME)
        .with_cli_path(args.config.clone())
        .resolve();
    let config = resolved.config;

    init_tracing(&config.logging.level);

    match (&resolved.path, resolved.problem) {
        (Some(path), Some(e)) => {
            warn!(path = %path.display(), "{}. Using compiled defaults.", e)
        }
        (None, Some(e)) => warn!("{}. Using compiled defaults.", e),
        (Some(path), None) => info!(path = %path.display(), "Configuration loaded"),
        (None, None) => info!("No configuration file found, using compiled defaults"),
    }

    let engine = Arc::new(TesseractCli::from_config(&config.ocr));
    let classifier: Arc<dyn ReviewClassifier> =
        Arc::new(ScreenshotClassifier::new(engine).with_language(config.ocr.language.clone()));

    match args.command.unwrap_or(Command::Serve { bind: None, port: None }) {
        Command::Serve { bind, port } => {
            serve(config, classifier, bind, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { image } => verify(classifier, &image).await,
    }
}

fn init_tracing(configured_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("nyxa_ss={0},nyxa_common={0},tower_http=info", configured_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(
    config: TomlConfig,
    classifier: Arc<dyn ReviewClassifier>,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    info!(
        "Starting nyxa-ss v{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let bind_address = bind.unwrap_or(config.bind_address);
    let port = port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_address, port))?;

    // Create event bus for SSE broadcasting
    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let state = AppState::new(classifier, event_bus.clone(), config.max_request_bytes);

    let sweeper = spawn_idle_sweeper(
        state.sessions.clone(),
        event_bus,
        config.session_idle_timeout_secs,
        SWEEP_INTERVAL,
    );
    info!(
        idle_timeout_secs = config.session_idle_timeout_secs,
        "Idle session sweep started"
    );

    let app = nyxa_ss::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// MIME type a browser would declare for this file name
fn mime_from_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn verify(classifier: Arc<dyn ReviewClassifier>, image: &Path) -> Result<ExitCode> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let file_name = image.file_name().map(|n| n.to_string_lossy().into_owned());
    let artifact = UploadedArtifact::new(file_name, mime_from_extension(image), bytes);

    let mut flow = FlowController::new(classifier);
    flow.start_verification()?;

    let progress = |percent: u8| tracing::debug!(percent, "OCR progress");
    match flow.upload_file(artifact, &progress).await? {
        UploadOutcome::Rejected(reason) => info!(reason = %reason, "Screenshot rejected"),
        UploadOutcome::Completed(transition) => {
            info!(new_step = %transition.new_step, "Screenshot classified")
        }
    }

    let snapshot = flow.state().snapshot();
    let mut output = serde_json::to_value(&snapshot)?;
    if snapshot.step == FlowStep::Reward {
        output["rewards"] = serde_json::to_value(reward_links())?;
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(if snapshot.step == FlowStep::Reward {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
