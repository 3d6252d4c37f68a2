//! CLI binary for merleau.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnalysisConfig` and prints the analysis.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use merleau::{
    analyze_video, is_youtube_url, AnalysisConfig, AnalysisProgressCallback, AnalysisResult,
    NoopProgressCallback, ProgressCallback, DEFAULT_MODEL, DEFAULT_PROMPT,
};
use std::io;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Console progress ─────────────────────────────────────────────────────────

/// Prints each stage as a line and spins while the upload is processing.
struct ConsoleProgress {
    model: String,
    /// Remote links are not uploaded, so there is nothing to wait for.
    remote: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    fn new(model: &str, remote: bool) -> Arc<Self> {
        Arc::new(Self {
            model: model.to_string(),
            remote,
            spinner: Mutex::new(None),
        })
    }

    fn start_spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Waiting for file to be processed...");
        bar
    }
}

impl AnalysisProgressCallback for ConsoleProgress {
    fn on_upload_complete(&self, uri: &str) {
        if !self.remote {
            println!("Upload complete. File URI: {uri}");
        }
    }

    fn on_processing(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            slot.get_or_insert_with(Self::start_spinner).tick();
        }
    }

    fn on_analyzing(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message("File processed.");
            }
        }
        println!("\nAnalyzing video with {}...", self.model);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a local video with the default prompt
  ponty video.mp4

  # Ask a specific question
  ponty video.mp4 -p "What are the main topics discussed?"

  # Analyze a YouTube video (no upload needed)
  ponty "https://www.youtube.com/watch?v=dQw4w9WgXcQ"

  # Another model, no cost report
  ponty video.mp4 -m gemini-2.0-flash --no-cost

  # Machine-readable result
  ponty video.mp4 --json > analysis.json

PRICING:
  Estimates use $0.15 / $0.60 per 1M input / output tokens for every model.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY    Google Gemini API key (also read from .env)
  GEMINI_API_BASE   Override the Gemini REST endpoint
  RUST_LOG          Override log filtering (e.g. merleau=debug)

SETUP:
  1. Get a key:   https://aistudio.google.com/apikey
  2. Save it:     echo GEMINI_API_KEY=... > .env
  3. Analyze:     ponty video.mp4
"#;

/// Analyze videos with Google Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "ponty",
    version,
    about = "Video analysis with Google Gemini",
    long_about = "Upload a local video (or reference a YouTube link), wait for Gemini to \
process it, ask a question about it, and print the answer with token usage and an \
estimated cost.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a video file or a YouTube URL.
    video: Option<String>,

    /// Question or instruction about the video.
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Gemini model to use.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Hide token usage and cost information.
    #[arg(long)]
    no_cost: bool,

    /// Gemini API key (overrides .env).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seconds between processing-status checks.
    #[arg(long, env = "MERLEAU_POLL_INTERVAL", default_value_t = 2,
          value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Give up after this many status checks (default: wait indefinitely).
    #[arg(long, env = "MERLEAU_MAX_POLLS",
          value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: Option<u32>,

    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MERLEAU_VERBOSE")]
    verbose: bool,

    /// Print only the analysis text.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the key may come from the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(video) = cli.video.clone() else {
        Cli::command().print_help().ok();
        return ExitCode::FAILURE;
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs stay off stdout and are silent unless asked for.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, &video).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, video: &str) -> Result<()> {
    let chatty = !cli.quiet && !cli.json;
    let remote = is_youtube_url(video);

    let progress: ProgressCallback = if chatty {
        ConsoleProgress::new(&cli.model, remote) as Arc<dyn AnalysisProgressCallback>
    } else {
        Arc::new(NoopProgressCallback)
    };
    let config = build_config(cli, progress)?;

    if chatty {
        if remote {
            println!("Analyzing YouTube video: {video}");
        } else {
            println!("Uploading video: {video}");
        }
    }

    let result = analyze_video(video, &config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        println!("{json}");
    } else if cli.quiet {
        println!("{}", result.text);
    } else {
        print_report(&result, !cli.no_cost);
    }
    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: ProgressCallback) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .prompt(&cli.prompt)
        .model(&cli.model)
        .poll_interval(Duration::from_secs(cli.poll_interval))
        .progress_callback(progress);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(n) = cli.max_polls {
        builder = builder.max_polls(n);
    }
    Ok(builder.build()?)
}

fn print_report(result: &AnalysisResult, show_cost: bool) {
    println!("\n--- Video Analysis ---");
    println!("{}", result.text);

    if show_cost {
        println!("\n--- Usage Information ---");
        println!("Prompt tokens: {}", result.prompt_tokens);
        println!("Response tokens: {}", result.response_tokens);
        println!("Total tokens: {}", result.total_tokens);
        println!("\nEstimated cost:");
        println!("  Input:  ${:.6}", result.input_cost);
        println!("  Output: ${:.6}", result.output_cost);
        println!("  Total:  ${:.6}", result.total_cost);
    }
}
