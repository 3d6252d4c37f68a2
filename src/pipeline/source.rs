//! Source classification: is the input a YouTube link or a local file?
//!
//! YouTube links are handed to Gemini by reference and never downloaded.
//! Every other string, including other `https://` URLs, is treated as a
//! local path and later checked for existence.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// MIME type sent with remote references and unknown extensions.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

static RE_YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)")
        .unwrap()
});

/// Check if the input string is a YouTube watch, short-link or Shorts URL.
pub fn is_youtube_url(input: &str) -> bool {
    RE_YOUTUBE.is_match(input)
}

/// Where the video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A URL Gemini can fetch itself.
    Remote(String),
    /// A file on this machine that must be uploaded first.
    Local(PathBuf),
}

impl VideoSource {
    pub fn classify(input: &str) -> Self {
        if is_youtube_url(input) {
            VideoSource::Remote(input.to_string())
        } else {
            VideoSource::Local(PathBuf::from(input))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, VideoSource::Remote(_))
    }
}

/// Guess the upload MIME type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mpeg" | "mpg" => "video/mpeg",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "3gp" => "video/3gpp",
        _ => DEFAULT_VIDEO_MIME,
    }
}
