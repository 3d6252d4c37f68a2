//! Submission: make the video available to the service.
//!
//! Remote links become a [`MediaPart`] immediately with no transfer. Local
//! files are checked for existence *before* any network traffic, then
//! uploaded; the returned handle still has to pass through
//! [`crate::pipeline::poll`] before it can be referenced.
//!
//! ## Staging in-memory uploads
//!
//! The browser front end receives video bytes, not a path. [`stage_bytes`]
//! writes them into a fresh `TempDir` under the original file name so the
//! upload keeps a meaningful display name and MIME type. The directory is
//! removed when the [`StagedUpload`] is dropped, whether the analysis
//! succeeded, failed or panicked.

use crate::error::MerleauError;
use crate::pipeline::source::{mime_type_for, VideoSource, DEFAULT_VIDEO_MIME};
use crate::progress::AnalysisProgressCallback;
use crate::service::{MediaFile, MediaPart, MediaService};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Outcome of submitting a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Ready to use as-is.
    Remote(MediaPart),
    /// Uploaded; may still be processing.
    Uploaded(MediaFile),
}

/// Submit `source` to the service and report the resulting location.
pub async fn submit(
    service: &dyn MediaService,
    source: &VideoSource,
    progress: Option<&dyn AnalysisProgressCallback>,
) -> Result<Submission, MerleauError> {
    match source {
        VideoSource::Remote(url) => {
            info!("Using remote video by reference: {}", url);
            if let Some(cb) = progress {
                cb.on_upload_complete(url);
            }
            Ok(Submission::Remote(MediaPart::FileData {
                uri: url.clone(),
                mime_type: DEFAULT_VIDEO_MIME.to_string(),
            }))
        }
        VideoSource::Local(path) => {
            ensure_exists(path)?;
            let file = service.upload(path, mime_type_for(path)).await?;
            info!("Upload complete. File URI: {}", file.uri);
            if let Some(cb) = progress {
                cb.on_upload_complete(&file.uri);
            }
            Ok(Submission::Uploaded(file))
        }
    }
}

/// Fail with [`MerleauError::FileNotFound`] unless `path` is an existing file.
pub fn ensure_exists(path: &Path) -> Result<(), MerleauError> {
    if !path.is_file() {
        return Err(MerleauError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("Resolved local video: {}", path.display());
    Ok(())
}

/// In-memory video bytes written to a private temp directory.
pub struct StagedUpload {
    path: PathBuf,
    /// Kept alive so the directory outlives the analysis.
    _temp_dir: TempDir,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `bytes` to `<tempdir>/<file_name>`.
///
/// Only the final component of `file_name` is used, so a browser-supplied
/// name like `../../etc/passwd` cannot escape the temp directory.
pub fn stage_bytes(bytes: &[u8], file_name: &str) -> Result<StagedUpload, MerleauError> {
    let staging_err = |source| MerleauError::Staging {
        file_name: file_name.to_string(),
        source,
    };
    let safe_name = sanitize_file_name(file_name);
    let temp_dir = tempfile::Builder::new()
        .prefix("merleau-")
        .tempdir()
        .map_err(staging_err)?;
    let path = temp_dir.path().join(&safe_name);
    std::fs::write(&path, bytes).map_err(staging_err)?;
    debug!("Staged {} bytes at {}", bytes.len(), path.display());
    Ok(StagedUpload {
        path,
        _temp_dir: temp_dir,
    })
}

fn sanitize_file_name(file_name: &str) -> String {
    Path::new(file_name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| "upload.mp4".to_string())
}
