//! Browser sessions: a cookie-keyed map of [`AnalysisHistory`].
//!
//! Sessions live in server memory only. The cookie carries an opaque random
//! id and nothing else. Sessions idle for longer than the store's TTL are
//! dropped, and the store never holds more than `max_sessions` of them; when
//! full, the least recently seen session is evicted.

use crate::history::{AnalysisHistory, HistoryEntry};
use crate::output::AnalysisResult;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "merleau_session";

/// Default idle time after which a session is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default upper bound on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Session {
    history: AnalysisHistory,
    last_seen: Instant,
}

/// History for every live browser session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that forgets sessions idle for `ttl` and keeps at most
    /// `max_sessions` (minimum 1).
    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn record(&self, session: &str, file_name: &str, prompt: &str, result: &AnalysisResult) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.prune(&mut sessions, now);

        if !sessions.contains_key(session) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!("Session store full; evicting least recently seen session");
                sessions.remove(&id);
            }
        }

        let entry = sessions.entry(session.to_string()).or_insert_with(|| Session {
            history: AnalysisHistory::new(),
            last_seen: now,
        });
        entry.last_seen = now;
        entry.history.record(file_name, prompt, result);
    }

    /// Entries for `session`, most recent first. Unknown or expired sessions
    /// are empty. Reading counts as activity.
    pub async fn recent(&self, session: &str) -> Vec<HistoryEntry> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.prune(&mut sessions, now);
        match sessions.get_mut(session) {
            Some(s) => {
                s.last_seen = now;
                s.history.recent().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub async fn clear(&self, session: &str) {
        if let Some(s) = self.sessions.write().await.get_mut(session) {
            s.history.clear();
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn prune(&self, sessions: &mut HashMap<String, Session>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_seen) <= self.ttl);
        if sessions.len() < before {
            debug!("Dropped {} idle sessions", before - sessions.len());
        }
    }
}

/// The session id from the request's `Cookie` header, if any.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && is_valid_session_id(value))
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a new session.
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// A random v4 UUID as 32 lowercase hex characters.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn is_valid_session_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
