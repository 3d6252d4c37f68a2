//! Configuration types for video analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The CLI and the browser front end both map
//! their inputs onto this one struct before calling
//! [`crate::analyze::analyze_video`].

use crate::error::MerleauError;
use crate::progress::ProgressCallback;
use crate::prompts::{DEFAULT_MODEL, DEFAULT_PROMPT};
use crate::service::MediaService;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the Gemini REST base URL.
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

/// Public Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Configuration for one video analysis.
///
/// # Example
/// ```rust
/// use merleau::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.0-flash")
///     .prompt("List every person who appears")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.0-flash");
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Question asked about the video. Default: [`DEFAULT_PROMPT`].
    pub prompt: String,

    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Explicit API key. Takes precedence over the environment.
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is `None`.
    /// Default: [`API_KEY_ENV`].
    pub api_key_env: String,

    /// REST base URL. If None, uses `GEMINI_API_BASE` or [`DEFAULT_API_BASE`].
    pub api_base: Option<String>,

    /// Delay between processing-state checks. Default: 2 s.
    pub poll_interval: Duration,

    /// Give up after this many status checks. Default: None (wait forever).
    ///
    /// Uploaded videos normally leave `PROCESSING` within a minute, but the
    /// service gives no upper bound, so the default keeps waiting.
    pub max_polls: Option<u32>,

    /// Per-HTTP-request timeout in seconds. Default: 600.
    ///
    /// Large uploads go up in a single request, so this is generous.
    pub request_timeout_secs: u64,

    /// Pre-constructed media service. Takes precedence over the built-in
    /// Gemini REST client.
    pub service: Option<Arc<dyn MediaService>>,

    /// Progress events sink. If None, polling prints `.` markers to stdout.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: API_KEY_ENV.to_string(),
            api_base: None,
            poll_interval: Duration::from_secs(2),
            max_polls: None,
            request_timeout_secs: 600,
            service: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("prompt", &self.prompt)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("api_base", &self.api_base)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("service", &self.service.as_ref().map(|_| "<dyn MediaService>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the API key: explicit key first, then the environment.
    ///
    /// Empty strings count as absent, so a blank browser field falls back to
    /// the server's environment just like an omitted `--api-key`.
    pub fn resolve_api_key(&self) -> Result<String, MerleauError> {
        let from_env = std::env::var(&self.api_key_env).ok();
        pick_api_key(self.api_key.as_deref(), from_env.as_deref()).ok_or_else(|| {
            MerleauError::MissingApiKey {
                var: self.api_key_env.clone(),
            }
        })
    }

    /// Base URL for the REST client.
    pub fn resolve_api_base(&self) -> String {
        self.api_base
            .clone()
            .or_else(|| std::env::var(API_BASE_ENV).ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }
}

fn pick_api_key(explicit: Option<&str>, from_env: Option<&str>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| from_env.map(str::trim).filter(|k| !k.is_empty()))
        .map(str::to_string)
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.config.api_key_env = var.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = Some(base.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = Some(n);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn service(mut self, service: Arc<dyn MediaService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, MerleauError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(MerleauError::InvalidConfig("model must not be empty".into()));
        }
        if c.prompt.trim().is_empty() {
            return Err(MerleauError::InvalidConfig("prompt must not be empty".into()));
        }
        if c.max_polls == Some(0) {
            return Err(MerleauError::InvalidConfig("max_polls must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(MerleauError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.prompt, "Explain what happens in this video");
        assert_eq!(c.model, "gemini-2.5-flash");
        assert_eq!(c.poll_interval, Duration::from_secs(2));
        assert_eq!(c.max_polls, None);
        assert_eq!(c.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn explicit_key_wins_over_env() {
        assert_eq!(pick_api_key(Some("k1"), Some("k2")).as_deref(), Some("k1"));
    }

    #[test]
    fn blank_key_falls_back_to_env() {
        assert_eq!(pick_api_key(Some("  "), Some("k2")).as_deref(), Some("k2"));
        assert_eq!(pick_api_key(None, Some("k2")).as_deref(), Some("k2"));
    }

    #[test]
    fn no_key_anywhere() {
        assert_eq!(pick_api_key(None, None), None);
        assert_eq!(pick_api_key(Some(""), Some("")), None);
    }

    #[test]
    fn resolve_reports_configured_variable() {
        let config = AnalysisConfig::builder()
            .api_key_env("MERLEAU_TEST_UNSET_KEY_5F2A")
            .build()
            .unwrap();
        match config.resolve_api_key() {
            Err(MerleauError::MissingApiKey { var }) => {
                assert_eq!(var, "MERLEAU_TEST_UNSET_KEY_5F2A")
            }
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_empty_model() {
        assert!(AnalysisConfig::builder().model(" ").build().is_err());
    }

    #[test]
    fn builder_rejects_zero_max_polls() {
        assert!(AnalysisConfig::builder().max_polls(0).build().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let c = AnalysisConfig::builder().api_key("secret-123").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-123"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn explicit_api_base_wins() {
        let c = AnalysisConfig::builder()
            .api_base("http://127.0.0.1:9999")
            .build()
            .unwrap();
        assert_eq!(c.resolve_api_base(), "http://127.0.0.1:9999");
    }
}
