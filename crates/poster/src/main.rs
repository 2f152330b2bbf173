//! Poster CLI - research, write and publish LinkedIn posts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use poster::{build_router, validate, AppState, Pipeline, PostResponse, ServiceConfig};

/// Poster CLI - AI-generated LinkedIn posts from a topic and a few links.
#[derive(Parser)]
#[command(name = "poster")]
#[command(about = "Research, write and publish AI-generated LinkedIn posts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP endpoint
    Serve {
        /// Port to listen on
        #[arg(long, env = "POSTER_PORT")]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long, env = "POSTER_BIND")]
        bind: Option<String>,
    },

    /// Run one request through the pipeline and print the response
    Generate {
        /// JSON request body
        #[arg(long)]
        request: PathBuf,
    },

    /// Check a request body without calling any API
    Validate {
        /// JSON request body
        #[arg(long)]
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("poster=debug,info")
    } else {
        EnvFilter::new("poster=info,warn")
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let mut config = ServiceConfig::from_env();

    match cli.command {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(config).await
        }
        Commands::Generate { request } => generate(config, &request).await,
        Commands::Validate { request } => validate_file(&request),
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let pipeline = Pipeline::with_defaults(config).context("Failed to build pipeline")?;
    let app = build_router(AppState::new(pipeline));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(addr = %addr, "Poster service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Poster service stopped");
    Ok(())
}

async fn generate(config: ServiceConfig, path: &Path) -> Result<()> {
    let body = read_request(path)?;
    let pipeline = Pipeline::with_defaults(config).context("Failed to build pipeline")?;

    let span = tracing::info_span!("post_request", request_id = %Uuid::new_v4());
    let result = pipeline.handle(&body).instrument(span).await;

    match result {
        Ok(outcome) => {
            let response = PostResponse::from(outcome);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_body())?);
            std::process::exit(1);
        }
    }
}

fn validate_file(path: &Path) -> Result<()> {
    let body = read_request(path)?;

    match validate(&body) {
        Ok(request) => {
            println!(
                "✅ Valid request: topic={:?}, links={}, image={}, delivery={}",
                request.topic,
                request.links.len(),
                request.generate_image,
                request.delivery.method()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    }
}

fn read_request(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
