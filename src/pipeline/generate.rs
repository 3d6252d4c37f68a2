//! Inference: one generate request for the media reference and prompt.
//!
//! No retries and no streaming. A failure here is returned exactly as the
//! service layer produced it.

use crate::error::MerleauError;
use crate::output::AnalysisResult;
use crate::progress::AnalysisProgressCallback;
use crate::service::{MediaPart, MediaService};
use std::time::Instant;
use tracing::{debug, info};

/// Ask `model` the `prompt` about `media` and price the answer.
pub async fn generate(
    service: &dyn MediaService,
    model: &str,
    media: &MediaPart,
    prompt: &str,
    progress: Option<&dyn AnalysisProgressCallback>,
) -> Result<AnalysisResult, MerleauError> {
    if let Some(cb) = progress {
        cb.on_analyzing();
    }
    info!("Analyzing video with {}", model);

    let start = Instant::now();
    let out = service.generate(model, media, prompt).await?;
    debug!(
        "{} prompt tokens, {} response tokens, {:?}",
        out.usage.prompt_token_count,
        out.usage.candidates_token_count,
        start.elapsed()
    );

    Ok(AnalysisResult::new(out.text, model, &out.usage))
}
