//! # merleau
//!
//! Understand videos with Google Gemini.
//!
//! Hand the library a local video file or a YouTube link and a question;
//! it uploads the file (links are passed by reference), waits for Gemini to
//! finish processing it, asks the question, and returns the answer together
//! with token usage and an estimated cost.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input
//!  │
//!  ├─ 1. Source    YouTube link or local path
//!  ├─ 2. Submit    reference the link, or upload the file
//!  ├─ 3. Poll      wait until the upload leaves PROCESSING (every 2 s)
//!  ├─ 4. Generate  one request: media + prompt → text + usage
//!  └─ 5. Cost      fixed per-token prices → AnalysisResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use merleau::{analyze_video, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY
//!     let config = AnalysisConfig::default();
//!     let result = analyze_video("demo.mp4", &config).await?;
//!     println!("{}", result.text);
//!     eprintln!("tokens: {} in / {} out, ${:.6}",
//!         result.prompt_tokens, result.response_tokens, result.total_cost);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ponty` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `web`   | on      | Enables the [`web`] module and the `merleau-web` browser UI (axum) |
//!
//! ## Pricing
//!
//! Costs use the `gemini-2.5-flash` sheet ($0.15 / $0.60 per 1M input /
//! output tokens) for every model, so estimates for other models are off.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod cost;
pub mod error;
pub mod history;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;
pub mod stream;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_bytes, analyze_sync, analyze_video, analyze_with_service};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use cost::{estimate_cost, CostEstimate};
pub use error::{MerleauError, ServiceError};
pub use history::{AnalysisHistory, HistoryEntry};
pub use output::AnalysisResult;
pub use pipeline::source::{is_youtube_url, VideoSource};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{DEFAULT_MODEL, DEFAULT_PROMPT, SUPPORTED_MODELS};
pub use service::{FileState, GeminiClient, MediaFile, MediaPart, MediaService, UsageMetadata};
pub use stream::{analyze_events, AnalysisEvent, AnalysisInput, EventStream};
