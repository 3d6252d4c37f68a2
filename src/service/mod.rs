//! The remote media service seam.
//!
//! Orchestration code never talks HTTP directly; it drives a
//! [`MediaService`], which has exactly the three operations an analysis
//! needs: upload a file, read a file's processing state, and generate
//! content from a media reference plus a prompt.
//!
//! [`gemini::GeminiClient`] is the production implementation. Tests and
//! embedders inject their own via
//! [`crate::config::AnalysisConfigBuilder::service`].

pub mod gemini;

use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use gemini::GeminiClient;

/// Server-side processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Still being transcoded/indexed; not usable yet.
    Processing,
    /// Ready to be referenced in a generate request.
    Active,
    /// The service gave up on the file.
    Failed,
    /// Anything else the service reports, including a missing state.
    #[default]
    #[serde(other)]
    Unspecified,
}

impl FileState {
    /// True while the service is still working on the file.
    pub fn is_processing(self) -> bool {
        self == FileState::Processing
    }
}

/// Handle to a file stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Resource name used for status lookups, e.g. `files/abc123`.
    pub name: String,
    /// URI used to reference the file from a generate request.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
}

/// Media reference sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPart {
    /// A URI the service can read: an uploaded file or a YouTube link.
    FileData { uri: String, mime_type: String },
}

impl MediaPart {
    pub fn uri(&self) -> &str {
        match self {
            MediaPart::FileData { uri, .. } => uri,
        }
    }
}

impl From<&MediaFile> for MediaPart {
    fn from(file: &MediaFile) -> Self {
        MediaPart::FileData {
            uri: file.uri.clone(),
            mime_type: file.mime_type.clone(),
        }
    }
}

/// Token accounting reported with a generate response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    pub prompt_token_count: u64,
    pub candidates_token_count: u64,
    pub total_token_count: u64,
}

/// Text plus usage from one generate call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub text: String,
    pub usage: UsageMetadata,
}

/// The three remote operations an analysis performs.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Transfer a local file; returns the new handle (usually `Processing`).
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<MediaFile, ServiceError>;

    /// Re-read a file handle by resource name.
    async fn get_file(&self, name: &str) -> Result<MediaFile, ServiceError>;

    /// Ask `model` about `media`.
    async fn generate(
        &self,
        model: &str,
        media: &MediaPart,
        prompt: &str,
    ) -> Result<GeneratedContent, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_state_parses_known_and_unknown() {
        let s: FileState = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(s, FileState::Processing);
        let s: FileState = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(s, FileState::Active);
        let s: FileState = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(s, FileState::Failed);
        let s: FileState = serde_json::from_str("\"STATE_UNSPECIFIED\"").unwrap();
        assert_eq!(s, FileState::Unspecified);
    }

    #[test]
    fn media_file_tolerates_missing_fields() {
        let f: MediaFile = serde_json::from_str(r#"{"name":"files/abc"}"#).unwrap();
        assert_eq!(f.name, "files/abc");
        assert_eq!(f.state, FileState::Unspecified);
        assert!(f.uri.is_empty());
    }

    #[test]
    fn usage_defaults_missing_counts_to_zero() {
        let u: UsageMetadata = serde_json::from_str(r#"{"promptTokenCount":12}"#).unwrap();
        assert_eq!(u.prompt_token_count, 12);
        assert_eq!(u.candidates_token_count, 0);
    }

    #[test]
    fn media_part_from_file_keeps_uri() {
        let f = MediaFile {
            name: "files/x".into(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/x".into(),
            mime_type: "video/webm".into(),
            state: FileState::Active,
        };
        let part = MediaPart::from(&f);
        assert_eq!(part.uri(), f.uri);
    }
}
