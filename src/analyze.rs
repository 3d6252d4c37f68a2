//! Top-level analysis entry points.
//!
//! Every front end funnels into [`analyze_video`]: resolve the key, classify
//! the source, submit, wait, generate. Input problems (no key, no file) are
//! reported before the first network request.

use crate::config::AnalysisConfig;
use crate::error::MerleauError;
use crate::output::AnalysisResult;
use crate::pipeline::poll::{wait_for_processing, PollPolicy};
use crate::pipeline::source::VideoSource;
use crate::pipeline::submit::{stage_bytes, submit, Submission};
use crate::pipeline::generate::generate;
use crate::service::{GeminiClient, MediaPart, MediaService};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Analyze a local video file or YouTube URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`: local file path or YouTube URL
/// * `config`: prompt, model, key and polling configuration
///
/// # Errors
/// - [`MerleauError::MissingApiKey`]: no key in config or environment
/// - [`MerleauError::FileNotFound`]: local path does not exist
/// - [`MerleauError::ProcessingFailed`]: the service could not process the upload
/// - [`MerleauError::Service`]: any remote failure, unmodified
///
/// # Example
/// ```rust,no_run
/// use merleau::{analyze_video, AnalysisConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalysisConfig::builder().prompt("Summarise in one line").build()?;
/// let result = analyze_video("https://youtu.be/dQw4w9WgXcQ", &config).await?;
/// println!("{}\n${:.6}", result.text, result.total_cost);
/// # Ok(())
/// # }
/// ```
pub async fn analyze_video(
    input: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, MerleauError> {
    let input = input.as_ref();
    let total_start = Instant::now();
    info!("Starting analysis: {}", input);

    // ── Step 1: Credential ───────────────────────────────────────────────
    let api_key = config.resolve_api_key()?;

    // ── Step 2: Service ──────────────────────────────────────────────────
    let service = resolve_service(config, &api_key)?;

    // ── Steps 3-6: Classify, submit, wait, generate ──────────────────────
    let result = analyze_with_service(service.as_ref(), input, config).await?;

    info!(
        "Analysis complete: {} tokens, ${:.6}, {}ms",
        result.total_tokens,
        result.total_cost,
        total_start.elapsed().as_millis()
    );
    Ok(result)
}

/// Run the pipeline against an explicit service, skipping key resolution.
///
/// Useful when the caller already holds a configured client.
pub async fn analyze_with_service(
    service: &dyn MediaService,
    input: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, MerleauError> {
    let progress = config.progress_callback.as_deref();
    let source = VideoSource::classify(input);

    let media = match submit(service, &source, progress).await? {
        Submission::Remote(part) => part,
        Submission::Uploaded(file) => {
            let policy = PollPolicy {
                interval: config.poll_interval,
                max_polls: config.max_polls,
            };
            let ready = wait_for_processing(service, file, &policy, progress).await?;
            MediaPart::from(&ready)
        }
    };

    generate(service, &config.model, &media, &config.prompt, progress).await
}

/// Analyze video bytes held in memory.
///
/// The bytes are staged to a temporary directory under `file_name` (only its
/// last path component is used) and removed when this call returns, on
/// success and on every error path.
pub async fn analyze_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, MerleauError> {
    let api_key = config.resolve_api_key()?;
    let service = resolve_service(config, &api_key)?;
    let staged = stage_bytes(bytes, file_name)?;
    let path = staged.path().to_string_lossy().into_owned();
    // `staged` is dropped (and the directory deleted) when this returns
    analyze_with_service(service.as_ref(), &path, config).await
}

/// Synchronous wrapper around [`analyze_video`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, MerleauError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MerleauError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_video(input, config))
}

/// Injected service first, otherwise a Gemini REST client for `api_key`.
pub(crate) fn resolve_service(
    config: &AnalysisConfig,
    api_key: &str,
) -> Result<Arc<dyn MediaService>, MerleauError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }
    let client = GeminiClient::new(
        api_key,
        config.resolve_api_base(),
        config.request_timeout_secs,
    )?;
    Ok(Arc::new(client))
}
