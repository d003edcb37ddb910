mod api;
mod auth;
mod config;
mod dto;
mod error;
mod example;
mod middleware;
mod state;

use std::sync::Arc;

use axum::http::{header, Method};
use clap::{Parser, Subcommand};
use corpreg_core::{CompanyService, SqliteCompanyRepository};
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::AuthManager;
use crate::config::{ConfigOverrides, ServerConfig};
use crate::middleware::rate_limit::RequestLimiter;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "corpreg", about = "Company registry REST API", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the API server.
    Serve {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Run a scripted create/update/get/delete walk-through against a server.
    Example {
        /// Base URL of the running server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corpreg=debug,corpreg_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Serve { overrides } => serve(ServerConfig::load(&overrides)?).await,
        Command::Example {
            base_url,
            overrides,
        } => {
            let config = ServerConfig::load(&overrides)?;
            let mut client = example::ExampleClient::new(&base_url);
            client
                .login(&config.auth.username, &config.auth.password)
                .await?;
            client.run().await
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let repo = Arc::new(SqliteCompanyRepository::connect(&config.database.path).await?);
    let limiter = RequestLimiter::new(&config.rate_limit)?;

    let state = AppState {
        companies: CompanyService::new(repo.clone()),
        auth: Arc::new(AuthManager::new(&config.auth)),
        limiter: Arc::new(limiter),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = api::app(state)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "corpreg listening on http://{} (rate limit {}/s, burst {})",
        config.bind_addr,
        config.rate_limit.requests_per_second,
        config.rate_limit.burst
    );

    let stopping = Arc::new(Notify::new());
    let notify = stopping.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        notify.notify_one();
    });

    let grace = config.shutdown_grace();
    tokio::select! {
        result = server => result?,
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("In-flight requests still running after {:?}; shutting down anyway", grace);
        }
    }

    tracing::info!("Closing company database");
    repo.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
