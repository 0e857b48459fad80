//! # homeauth server
//!
//! Serves the local credential commands over HTTP, backed by the in-memory
//! user store and forwarding self-service password changes to the configured
//! sync endpoint.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use homeauth_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use homeauth_core::AuthCrypto;
use homeauth_core::sync::{
    DispatcherSettings, HttpPasswordSync, PasswordCipher, SyncDispatcher,
};
use homeauth_server::{AppState, bootstrap, build_router};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "homeauth-server")]
#[command(about = "Local credential management server")]
struct Cli {
    /// Path to a homeauth.toml configuration file
    #[arg(long, env = "HOMEAUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "using configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    if config.dev_mode {
        warn!("DEV_MODE enabled; guard rails are relaxed");
    }

    let crypto = Arc::new(
        AuthCrypto::new(
            config.auth.password_pepper.as_bytes(),
            config.auth.token_key.as_bytes(),
        )
        .context("failed to initialise auth crypto")?,
    );

    let dispatcher = match &config.sync {
        Some(sync) => {
            let sink = HttpPasswordSync::new(sync.endpoint.clone(), sync.timeout)
                .context("failed to build password sync client")?;
            let cipher = PasswordCipher::new(&sync.key)
                .context("invalid password sync key")?;
            info!(endpoint = %sync.endpoint, "password sync enabled");
            Some(SyncDispatcher::spawn(
                Arc::new(sink),
                cipher,
                DispatcherSettings {
                    queue_capacity: sync.queue_capacity,
                    max_in_flight: sync.max_in_flight,
                    delivery_timeout: sync.timeout,
                },
            ))
        }
        None => None,
    };

    let backends = AppState::in_memory(crypto, dispatcher.as_ref().map(SyncDispatcher::queue));

    if let Some(owner) = config.owner.as_ref() {
        bootstrap::ensure_owner(&backends, owner)
            .await
            .context("failed to provision owner account")?;
    }

    let router = build_router(backends.state.clone());
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "homeauth server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(dispatcher) = dispatcher {
        dispatcher.shutdown().await;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
