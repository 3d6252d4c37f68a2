//! Readiness polling: wait until an uploaded file leaves `PROCESSING`.
//!
//! The service exposes no completion notification, only the file's `state`
//! field, so we re-read it on a fixed interval. With no poll budget
//! configured the loop waits as long as the service keeps answering
//! `PROCESSING`.

use crate::error::MerleauError;
use crate::progress::AnalysisProgressCallback;
use crate::service::{FileState, MediaFile, MediaService};
use std::io::Write;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often to poll, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits indefinitely.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_polls: None,
        }
    }
}

/// Poll `file` until it is no longer processing.
///
/// Every tick that finds the file still processing calls
/// [`AnalysisProgressCallback::on_processing`] once; with no callback a `.`
/// is printed to stdout instead, followed by a newline when polling ends.
///
/// # Errors
/// - [`MerleauError::ProcessingFailed`] when the service reports `FAILED`
/// - [`MerleauError::ProcessingTimeout`] when `max_polls` is exhausted
/// - [`MerleauError::Service`] when a status request fails
pub async fn wait_for_processing(
    service: &dyn MediaService,
    file: MediaFile,
    policy: &PollPolicy,
    progress: Option<&dyn AnalysisProgressCallback>,
) -> Result<MediaFile, MerleauError> {
    let mut file = file;
    let mut polls: u32 = 0;
    info!("Waiting for {} to be processed", file.name);

    while file.state.is_processing() {
        if policy.max_polls.is_some_and(|max| polls >= max) {
            end_dots(progress, polls);
            return Err(MerleauError::ProcessingTimeout {
                name: file.name,
                polls,
            });
        }

        match progress {
            Some(cb) => cb.on_processing(),
            None => print_dot(),
        }
        sleep(policy.interval).await;
        file = service.get_file(&file.name).await?;
        polls += 1;
        debug!("Poll {}: {} is {:?}", polls, file.name, file.state);
    }
    end_dots(progress, polls);

    match file.state {
        FileState::Failed => Err(MerleauError::ProcessingFailed { name: file.name }),
        FileState::Unspecified => {
            warn!("{} reported no processing state; continuing", file.name);
            Ok(file)
        }
        FileState::Active | FileState::Processing => {
            info!("File state: ACTIVE after {} polls", polls);
            Ok(file)
        }
    }
}

fn print_dot() {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, ".");
    let _ = out.flush();
}

fn end_dots(progress: Option<&dyn AnalysisProgressCallback>, polls: u32) {
    if progress.is_none() && polls > 0 {
        println!();
    }
}
