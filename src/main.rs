use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use docflow::{bootstrap, config::Config, create_router, queue::Worker, utils::init_logger, AppState};

#[derive(Parser)]
#[command(name = "docflow", version, about = "Document management service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the demo user if it does not exist
    Seed,
    /// Grant the admin role to an existing user
    Promote {
        /// Email address of the user
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    let (state, worker) = bootstrap(config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, worker).await,
        Command::Seed => {
            warn_if_ephemeral(&state);
            match state.auth.seed_demo_user().await? {
                Some(user) => info!(email = %user.email, "Demo user created"),
                None => info!("Demo user already exists"),
            }
            Ok(())
        }
        Command::Promote { email } => {
            warn_if_ephemeral(&state);
            let user = state.auth.promote(&email).await?;
            info!(email = %user.email, "User is now an admin");
            Ok(())
        }
    }
}

async fn serve(state: AppState, worker: Worker) -> anyhow::Result<()> {
    let (stop_worker, worker_stopped) = oneshot::channel::<()>();
    let worker_handle = worker.spawn_until(async move {
        let _ = worker_stopped.await;
    });

    if state.config.processing.recover_on_startup {
        state
            .lifecycle
            .recover_interrupted()
            .await
            .context("startup recovery failed")?;
    }

    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("invalid HOST/PORT")?;
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    // Let running extractions finish; queued jobs stay PENDING for the next start.
    let _ = stop_worker.send(());
    if let Err(e) = worker_handle.await {
        warn!("Processing worker ended abnormally: {}", e);
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn warn_if_ephemeral(state: &AppState) {
    if state.database.is_none() {
        warn!("No database configured; this change only lives for the current process");
    }
}
