//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the analysis moves through upload, processing and inference.
//!
//! The orchestration code only ever talks to this trait, so the console
//! front end (a spinner on stderr), the browser front end (events pushed down
//! an HTTP response) and tests (counters) plug in without the library knowing
//! which one is active.
//!
//! # Example
//!
//! ```rust
//! use merleau::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Ticks(AtomicUsize);
//!
//! impl AnalysisProgressCallback for Ticks {
//!     fn on_processing(&self) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Ticks(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestration layer as an analysis progresses.
///
/// All methods default to no-ops so implementors override only what they
/// render. Implementations must be `Send + Sync`: the browser front end runs
/// each analysis on its own task.
pub trait AnalysisProgressCallback: Send + Sync {
    /// The video is available to the service.
    ///
    /// # Arguments
    /// * `uri`: the uploaded file's URI, or the remote URL itself when no
    ///   upload was needed
    fn on_upload_complete(&self, uri: &str) {
        let _ = uri;
    }

    /// One status check found the video still processing. Called once per
    /// poll, before the poller sleeps.
    fn on_processing(&self) {}

    /// The inference request is about to be sent.
    fn on_analyzing(&self) {}
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
