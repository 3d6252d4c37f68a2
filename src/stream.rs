//! Event-stream analysis API: the same pipeline, reported as a `Stream`.
//!
//! [`crate::analyze::analyze_video`] reports progress through callbacks and
//! returns once. Front ends that forward progress over a connection (the
//! browser UI streams NDJSON) want the events as values instead.
//! [`analyze_events`] runs the analysis on its own task and yields
//! [`AnalysisEvent`]s, always ending with exactly one `Completed` or
//! `Failed`.

use crate::analyze::{analyze_bytes, analyze_video};
use crate::config::AnalysisConfig;
use crate::error::MerleauError;
use crate::output::AnalysisResult;
use crate::progress::AnalysisProgressCallback;
use serde::Serialize;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// A boxed stream of analysis events.
pub type EventStream = Pin<Box<dyn Stream<Item = AnalysisEvent> + Send>>;

/// What to analyze.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    /// Local path or YouTube URL.
    Source(String),
    /// Video bytes received from a client, with their original file name.
    Upload { bytes: Vec<u8>, file_name: String },
}

/// Progress of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// The video is available to the service.
    Uploaded { uri: String },
    /// The upload is still processing; `tick` counts from 1.
    Processing { tick: u32 },
    /// The generate request is in flight.
    Analyzing,
    /// Terminal: success.
    Completed { result: AnalysisResult },
    /// Terminal: failure, rendered for display.
    Failed { message: String, input_error: bool },
}

impl AnalysisEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisEvent::Completed { .. } | AnalysisEvent::Failed { .. })
    }

    fn from_outcome(outcome: Result<AnalysisResult, MerleauError>) -> Self {
        match outcome {
            Ok(result) => AnalysisEvent::Completed { result },
            Err(e) => AnalysisEvent::Failed {
                input_error: e.is_input_error(),
                message: e.to_string(),
            },
        }
    }
}

/// Forwards callback invocations into the event channel.
struct ChannelProgress {
    tx: UnboundedSender<AnalysisEvent>,
    ticks: AtomicU32,
}

impl AnalysisProgressCallback for ChannelProgress {
    fn on_upload_complete(&self, uri: &str) {
        let _ = self.tx.send(AnalysisEvent::Uploaded {
            uri: uri.to_string(),
        });
    }

    fn on_processing(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.tx.send(AnalysisEvent::Processing { tick });
    }

    fn on_analyzing(&self) {
        let _ = self.tx.send(AnalysisEvent::Analyzing);
    }
}

/// Start an analysis on a new task and stream its events.
///
/// Any `progress_callback` already in `config` is replaced. Must be called
/// from within a tokio runtime. Dropping the stream does not cancel the
/// analysis; it runs to completion and its remaining events are discarded.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use merleau::{analyze_events, AnalysisConfig, AnalysisEvent, AnalysisInput};
///
/// # #[tokio::main]
/// # async fn main() {
/// let input = AnalysisInput::Source("clip.mp4".into());
/// let mut events = analyze_events(input, AnalysisConfig::default());
/// while let Some(event) = events.next().await {
///     if let AnalysisEvent::Completed { result } = &event {
///         println!("{}", result.text);
///     }
/// }
/// # }
/// ```
pub fn analyze_events(input: AnalysisInput, config: AnalysisConfig) -> EventStream {
    let (tx, rx) = unbounded_channel();
    let progress = Arc::new(ChannelProgress {
        tx: tx.clone(),
        ticks: AtomicU32::new(0),
    });

    let mut config = config;
    config.progress_callback = Some(progress);

    tokio::spawn(async move {
        let outcome = match input {
            AnalysisInput::Source(source) => analyze_video(&source, &config).await,
            AnalysisInput::Upload { bytes, file_name } => {
                analyze_bytes(&bytes, &file_name, &config).await
            }
        };
        if tx.send(AnalysisEvent::from_outcome(outcome)).is_err() {
            debug!("Event receiver dropped before analysis finished");
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}
