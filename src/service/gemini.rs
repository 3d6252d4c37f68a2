//! Gemini REST client (`v1beta`) implementing [`MediaService`].
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | upload    | `POST /upload/v1beta/files` (resumable: `start`, then `upload, finalize`) |
//! | get_file  | `GET /v1beta/{name}` |
//! | generate  | `POST /v1beta/models/{model}:generateContent` |
//!
//! The key travels in the `x-goog-api-key` header so it never shows up in
//! URLs that reqwest includes in its error messages.

use super::{GeneratedContent, MediaFile, MediaPart, MediaService, UsageMetadata};
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Blocking-free HTTP client for the Gemini Files + GenerateContent APIs.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl MediaService for GeminiClient {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<MediaFile, ServiceError> {
        let io_err = |source| ServiceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let len = file.metadata().await.map_err(io_err)?.len();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        info!("Uploading {} ({} bytes, {})", display_name, len, mime_type);

        // ── Step 1: open a resumable session ─────────────────────────────
        let start = self
            .http
            .post(self.url("upload/v1beta/files"))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", len.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStartRequest {
                file: UploadFileMetadata {
                    display_name: &display_name,
                },
            })
            .send()
            .await?;
        let start = ensure_success(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::MalformedResponse(format!(
                    "upload session response has no {UPLOAD_URL_HEADER} header"
                ))
            })?;
        debug!("Upload session opened");

        // ── Step 2: stream the bytes and finalize ────────────────────────
        let body = Body::wrap_stream(ReaderStream::new(file));
        let resp = self
            .http
            .post(upload_url)
            .header(CONTENT_LENGTH, len)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let body: UploadResponse = read_json(resp).await?;

        info!("Uploaded as {} ({:?})", body.file.name, body.file.state);
        Ok(body.file)
    }

    async fn get_file(&self, name: &str) -> Result<MediaFile, ServiceError> {
        let resp = self
            .http
            .get(self.url(&format!("v1beta/{name}")))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let file: MediaFile = read_json(resp).await?;
        debug!("{} is {:?}", file.name, file.state);
        Ok(file)
    }

    async fn generate(
        &self,
        model: &str,
        media: &MediaPart,
        prompt: &str,
    ) -> Result<GeneratedContent, ServiceError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let request = build_request(media, prompt);

        let resp = self
            .http
            .post(self.url(&format!("v1beta/models/{model}:generateContent")))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let body: GenerateContentResponse = read_json(resp).await?;
        body.into_generated()
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct UploadStartRequest<'a> {
    file: UploadFileMetadata<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileMetadata<'a> {
    display_name: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: MediaFile,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    #[serde(rename_all = "camelCase")]
    FileData {
        mime_type: &'a str,
        file_uri: &'a str,
    },
    Text(&'a str),
}

fn build_request<'a>(media: &'a MediaPart, prompt: &'a str) -> GenerateContentRequest<'a> {
    let media_part = match media {
        MediaPart::FileData { uri, mime_type } => RequestPart::FileData {
            mime_type,
            file_uri: uri,
        },
    };
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![media_part, RequestPart::Text(prompt)],
        }],
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    usage_metadata: UsageMetadata,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Join the first candidate's text parts, skipping thought summaries.
    fn into_generated(self) -> Result<GeneratedContent, ServiceError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ServiceError::MalformedResponse(format!(
                "response has no text: {reason}"
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
            return Err(ServiceError::MalformedResponse(format!(
                "candidate has no text (finish reason {reason})"
            )));
        }

        Ok(GeneratedContent {
            text,
            usage: self.usage_metadata,
        })
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

// ── Response helpers ──────────────────────────────────────────────────────

/// Turn a non-2xx response into [`ServiceError::Api`], preferring the
/// service's own error message over the raw body.
async fn ensure_success(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.chars().take(500).collect(),
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ServiceError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let snippet: String = body.chars().take(200).collect();
        ServiceError::MalformedResponse(format!("{e} (body: {snippet})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape_matches_api() {
        let media = MediaPart::FileData {
            uri: "https://youtu.be/abc123".into(),
            mime_type: "video/mp4".into(),
        };
        let json = serde_json::to_value(build_request(&media, "Describe it")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"fileData": {"mimeType": "video/mp4", "fileUri": "https://youtu.be/abc123"}},
                        {"text": "Describe it"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn response_text_and_usage() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "A dog "}, {"text": "runs."}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 1000, "candidatesTokenCount": 500, "totalTokenCount": 1500}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let out = parsed.into_generated().unwrap();
        assert_eq!(out.text, "A dog runs.");
        assert_eq!(out.usage.prompt_token_count, 1000);
        assert_eq!(out.usage.candidates_token_count, 500);
        assert_eq!(out.usage.total_token_count, 1500);
    }

    #[test]
    fn thought_parts_are_skipped() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"thinking...","thought":true},{"text":"Answer"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_generated().unwrap().text, "Answer");
    }

    #[test]
    fn blocked_prompt_is_malformed_response() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        match parsed.into_generated() {
            Err(ServiceError::MalformedResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn upload_response_parses_file() {
        let body = r#"{"file":{"name":"files/abc","mimeType":"video/mp4",
            "uri":"https://generativelanguage.googleapis.com/v1beta/files/abc","state":"PROCESSING"}}"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.file.name, "files/abc");
        assert!(parsed.file.state.is_processing());
    }

    #[test]
    fn api_error_message_prefers_service_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid.");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(api_error_message(""), "empty response body");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = GeminiClient::new("k", "http://localhost:1234/", 5).unwrap();
        assert_eq!(c.url("/v1beta/files/x"), "http://localhost:1234/v1beta/files/x");
    }
}
