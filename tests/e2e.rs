//! End-to-end tests against the live Gemini API.
//!
//! These make real (billed) API calls. They are gated behind the
//! `E2E_ENABLED` environment variable and need `GEMINI_API_KEY`; local-file
//! tests also need a video at `MERLEAU_E2E_VIDEO`.
//!
//! Run with:
//!   E2E_ENABLED=1 MERLEAU_E2E_VIDEO=./sample.mp4 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_youtube -- --nocapture

use futures::StreamExt;
use merleau::{
    analyze_events, analyze_video, AnalysisConfig, AnalysisEvent, AnalysisInput,
    AnalysisProgressCallback, MerleauError, ServiceError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const YOUTUBE: &str = "https://www.youtube.com/watch?v=jNQXAC9IVRw";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED and a key are set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if std::env::var("GEMINI_API_KEY").map_or(true, |k| k.trim().is_empty()) {
            println!("SKIP: GEMINI_API_KEY is not set");
            return;
        }
    }};
}

fn sample_video() -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var("MERLEAU_E2E_VIDEO").ok()?);
    if p.is_file() {
        Some(p)
    } else {
        println!("SKIP: MERLEAU_E2E_VIDEO does not point at a file: {}", p.display());
        None
    }
}

#[derive(Default)]
struct Counts {
    uploads: AtomicUsize,
    ticks: AtomicUsize,
}

impl AnalysisProgressCallback for Counts {
    fn on_upload_complete(&self, uri: &str) {
        println!("  uploaded: {uri}");
        self.uploads.fetch_add(1, Ordering::SeqCst);
    }
    fn on_processing(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_youtube_link() {
    e2e_skip_unless_ready!();

    let config = AnalysisConfig::builder()
        .prompt("Describe this video in one sentence.")
        .build()
        .unwrap();
    let result = analyze_video(YOUTUBE, &config).await.unwrap();

    println!("{}", result.text);
    assert!(!result.text.trim().is_empty());
    assert!(result.prompt_tokens > 0);
    assert!(result.total_cost > 0.0);
    assert!((result.total_cost - (result.input_cost + result.output_cost)).abs() < 1e-12);
}

#[tokio::test]
async fn test_local_upload_with_progress() {
    e2e_skip_unless_ready!();
    let Some(video) = sample_video() else { return };

    let counts = Arc::new(Counts::default());
    let config = AnalysisConfig::builder()
        .prompt("What is the main subject of this video? One short paragraph.")
        .max_polls(150)
        .progress_callback(counts.clone())
        .build()
        .unwrap();
    let result = analyze_video(video.to_string_lossy(), &config).await.unwrap();

    println!("{}", result.text);
    println!("  {} processing ticks", counts.ticks.load(Ordering::SeqCst));
    assert_eq!(counts.uploads.load(Ordering::SeqCst), 1);
    assert!(!result.text.trim().is_empty());
    assert!(result.response_tokens > 0);
}

#[tokio::test]
async fn test_event_stream_upload() {
    e2e_skip_unless_ready!();
    let Some(video) = sample_video() else { return };

    let bytes = tokio::fs::read(&video).await.unwrap();
    let file_name = video.file_name().unwrap().to_string_lossy().into_owned();
    let config = AnalysisConfig::builder().max_polls(150).build().unwrap();

    let events: Vec<AnalysisEvent> =
        analyze_events(AnalysisInput::Upload { bytes, file_name }, config)
            .collect()
            .await;

    assert!(matches!(events.first(), Some(AnalysisEvent::Uploaded { .. })));
    match events.last() {
        Some(AnalysisEvent::Completed { result }) => assert!(!result.text.is_empty()),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_key_is_reported_by_service() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let config = AnalysisConfig::builder()
        .api_key("not-a-real-key")
        .build()
        .unwrap();
    let err = analyze_video(YOUTUBE, &config).await.unwrap_err();

    println!("  {err}");
    assert!(
        matches!(err, MerleauError::Service(ServiceError::Api { status, .. }) if (400..500).contains(&status)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unknown_model_is_reported_by_service() {
    e2e_skip_unless_ready!();

    let config = AnalysisConfig::builder()
        .model("gemini-does-not-exist")
        .build()
        .unwrap();
    let err = analyze_video(YOUTUBE, &config).await.unwrap_err();

    println!("  {err}");
    assert!(matches!(err, MerleauError::Service(_)), "got {err:?}");
}
