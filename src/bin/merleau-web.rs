//! Browser front end for merleau.
//!
//! Serves the single-page UI and its API from [`merleau::web::router`].

use anyhow::{Context, Result};
use clap::Parser;
use merleau::web::{router, AppState};
use merleau::AnalysisConfig;
use std::io;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve the merleau video-analysis UI.
#[derive(Parser, Debug)]
#[command(name = "merleau-web", version, about = "Browser UI for Gemini video analysis")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "MERLEAU_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8501)]
    port: u16,

    /// Largest accepted upload, in megabytes.
    #[arg(long, env = "MERLEAU_MAX_UPLOAD_MB", default_value_t = 200,
          value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_upload_mb: u64,

    /// Seconds between processing-status checks.
    #[arg(long, env = "MERLEAU_POLL_INTERVAL", default_value_t = 2,
          value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MERLEAU_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Keys are resolved per request (form field first, then GEMINI_API_KEY),
    // so a server without a key still starts.
    let base_config = AnalysisConfig::builder()
        .poll_interval(Duration::from_secs(args.poll_interval))
        .build()?;
    let max_upload_bytes = usize::try_from(args.max_upload_mb * 1024 * 1024)
        .context("--max-upload-mb is too large for this platform")?;

    let app = router(AppState::new(base_config, max_upload_bytes));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("merleau-web listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
