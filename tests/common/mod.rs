//! Scripted `MediaService` double shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use merleau::error::ServiceError;
use merleau::service::GeneratedContent;
use merleau::{AnalysisProgressCallback, FileState, MediaFile, MediaPart, MediaService, UsageMetadata};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ANSWER: &str = "A cat sleeps on a sofa.";

/// What the service saw on each upload.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub mime_type: String,
    /// Whether the file was on disk while the upload ran.
    pub existed: bool,
}

/// Plays back a fixed sequence of processing states and counts every call.
///
/// `upload` returns the first scripted state; each `get_file` advances to
/// the next one and repeats the last once the script runs out.
pub struct ScriptedService {
    states: Mutex<VecDeque<FileState>>,
    generate_error: Option<(u16, String)>,
    pub uploads: AtomicUsize,
    pub status_checks: AtomicUsize,
    pub generates: AtomicUsize,
    pub upload_records: Mutex<Vec<UploadRecord>>,
    /// (model, media uri, prompt) of the last generate call.
    pub last_generate: Mutex<Option<(String, String, String)>>,
}

impl ScriptedService {
    pub fn new(states: &[FileState]) -> Arc<Self> {
        Arc::new(Self {
            states: Mutex::new(states.iter().copied().collect()),
            generate_error: None,
            uploads: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            generates: AtomicUsize::new(0),
            upload_records: Mutex::new(Vec::new()),
            last_generate: Mutex::new(None),
        })
    }

    /// A service whose generate call fails with an API error.
    pub fn failing_generate(states: &[FileState], status: u16, message: &str) -> Arc<Self> {
        let mut s = Arc::try_unwrap(Self::new(states)).ok().unwrap();
        s.generate_error = Some((status, message.to_string()));
        Arc::new(s)
    }

    pub fn total_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
            + self.status_checks.load(Ordering::SeqCst)
            + self.generates.load(Ordering::SeqCst)
    }

    fn current_state(&self, advance: bool) -> FileState {
        let mut states = self.states.lock().unwrap();
        if advance && states.len() > 1 {
            states.pop_front();
        }
        states.front().copied().unwrap_or(FileState::Active)
    }

    fn file(&self, state: FileState) -> MediaFile {
        MediaFile {
            name: "files/scripted123".into(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/scripted123".into(),
            mime_type: "video/mp4".into(),
            state,
        }
    }
}

#[async_trait]
impl MediaService for ScriptedService {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<MediaFile, ServiceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.upload_records.lock().unwrap().push(UploadRecord {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            existed: path.is_file(),
        });
        Ok(self.file(self.current_state(false)))
    }

    async fn get_file(&self, name: &str) -> Result<MediaFile, ServiceError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        assert_eq!(name, "files/scripted123");
        Ok(self.file(self.current_state(true)))
    }

    async fn generate(
        &self,
        model: &str,
        media: &MediaPart,
        prompt: &str,
    ) -> Result<GeneratedContent, ServiceError> {
        self.generates.fetch_add(1, Ordering::SeqCst);
        *self.last_generate.lock().unwrap() =
            Some((model.to_string(), media.uri().to_string(), prompt.to_string()));

        if let Some((status, ref message)) = self.generate_error {
            return Err(ServiceError::Api {
                status,
                message: message.clone(),
            });
        }
        Ok(GeneratedContent {
            text: ANSWER.into(),
            usage: UsageMetadata {
                prompt_token_count: 1000,
                candidates_token_count: 500,
                total_token_count: 1500,
            },
        })
    }
}

/// Records every progress callback.
#[derive(Default)]
pub struct RecordingProgress {
    pub uploaded: Mutex<Vec<String>>,
    pub ticks: AtomicUsize,
    pub analyzing: AtomicUsize,
}

impl AnalysisProgressCallback for RecordingProgress {
    fn on_upload_complete(&self, uri: &str) {
        self.uploaded.lock().unwrap().push(uri.to_string());
    }

    fn on_processing(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_analyzing(&self) {
        self.analyzing.fetch_add(1, Ordering::SeqCst);
    }
}

/// A small file with a video extension in a fresh temp dir.
pub fn sample_video(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    (dir, path)
}
