//! textfile-exporter
//!
//! Periodically reads Prometheus text-format snapshot files from a directory
//! (or a single file) and republishes their samples on `/metrics`.
//!
//! ```text
//! textfile-exporter --config exporter.yaml
//! textfile-exporter --path /var/lib/node_exporter --listen 127.0.0.1:9014
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use textfile_core::error::Result;
use textfile_exporter::{app_state::AppState, config, router};

#[derive(Parser)]
#[command(name = "textfile-exporter", version, about = "Republish Prometheus textfile snapshots over HTTP")]
struct Cli {
    /// YAML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Override `web.listen`.
    #[arg(long)]
    listen: Option<String>,

    /// Override `scan.path`.
    #[arg(long)]
    path: Option<String>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind().as_str(), "textfile-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => config::load_from_file(path)?,
        None => config::ExporterConfig::default(),
    };
    if let Some(listen) = cli.listen {
        cfg.web.listen = listen;
    }
    if let Some(path) = cli.path {
        cfg.scan.path = path;
    }
    cfg.validate()?;

    let listen = cfg.web.listen_addr()?;
    let state = AppState::new(cfg)?;
    state.log_settings();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scanner = state.scanner(state.stale_file_hook());
    let scan_handle = tokio::spawn(scanner.run(shutdown_rx));

    let app = router::build_router(state);

    tracing::info!(%listen, "textfile-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await;

    if let Err(e) = scan_handle.await {
        tracing::warn!(error = %e, "scanner task ended abnormally");
    }
    served?;

    tracing::info!("textfile-exporter stopped");
    Ok(())
}
