//! PitchLens HTTP server.
//!
//! Accepts research requests as multipart forms and answers with the
//! structured findings, scorecard and report path.

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use pitchlens_core::{Collaborators, Pipeline};
use pitchlens_shared::load_config;
use tokio::net::TcpListener;
use tracing::info;

use routes::AppState;

/// PitchLens research server.
#[derive(Parser)]
#[command(name = "pitchlens-server", version, about = "Serve the PitchLens research pipeline over HTTP.")]
struct Args {
    /// Address to listen on (overrides `[server].bind`).
    #[arg(long, env = "PITCHLENS_BIND")]
    bind: Option<String>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match args.verbose {
        0 => "pitchlens=info,tower_http=info",
        1 => "pitchlens=debug,tower_http=debug",
        _ => "pitchlens=trace,tower_http=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if args.json_logs {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args);

    let config = load_config()?;
    let collaborators = Collaborators::from_config(&config)?;
    let pipeline = Pipeline::standard(collaborators, config.platform.clone());

    let state = AppState {
        pipeline: Arc::new(pipeline),
        uploads_dir: PathBuf::from(&config.defaults.uploads_dir),
    };
    let app = routes::router(state, config.server.max_upload_bytes);

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("failed to bind to {bind}"))?;
    info!(addr = %bind, "pitchlens server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .wrap_err("server error")?;

    Ok(())
}
