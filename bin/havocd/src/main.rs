//! Binary entrypoint for the havoc agent daemon.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bollard::Docker;
use clap::{Parser, ValueEnum};
use havoc_common::config::AppConfig;
use havoc_common::logging::{init_tracing, LogFormat};
use havoc_core::{RecoveryCoordinator, RecoveryTracker, SystemTargetFactory, TargetManager};
use havoc_net::GrpcServerBuilder;
use tokio::signal;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Havoc agent: node-local fault injection over gRPC",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "ADDR", help = "Override the gRPC listen address")]
    listen: Option<SocketAddr>,

    #[arg(long, value_enum, help = "Override the stdout log format")]
    log_format: Option<CliLogFormat>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Json,
    Pretty,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Json => LogFormat::StructuredJson,
            CliLogFormat::Pretty => LogFormat::Pretty,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/agent.toml"));
    candidates.push(PathBuf::from("/etc/havoc/agent.toml"));

    let loaded = AppConfig::load(&candidates)?;
    let mut config = loaded.config;
    if let Some(listen) = cli.listen {
        config.agent.listen = listen;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }

    init_tracing("havocd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using built-in defaults"),
    }

    // Constructing the client does not contact the daemon; an unreachable
    // daemon shows up per call as a capability failure on container targets.
    let docker =
        Docker::connect_with_local_defaults().context("unable to construct docker client")?;

    let tracker = Arc::new(RecoveryTracker::new());
    let factory = Arc::new(SystemTargetFactory::new(
        docker,
        config.service.clone(),
        config.docker.clone(),
    ));
    let manager = Arc::new(TargetManager::new(factory, Arc::clone(&tracker)));
    let coordinator = Arc::new(RecoveryCoordinator::new(Arc::clone(&tracker)));

    let server = GrpcServerBuilder::new(config.agent.listen, manager, coordinator)
        .spawn()
        .await?;
    info!(address = %server.local_addr(), "agent running; waiting for termination signal");

    shutdown_signal().await;
    info!("termination signal received; shutting down");
    server.shutdown().await?;

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut term = unix_signal(SignalKind::terminate()).expect("install SIGTERM handler");

    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = term.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
