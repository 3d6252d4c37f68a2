//! Per-session analysis history.
//!
//! The browser front end keeps one [`AnalysisHistory`] per session in memory.
//! Nothing is persisted; a restart or a new session starts empty.

use crate::output::AnalysisResult;
use serde::Serialize;

/// Characters of the prompt shown in history listings.
pub const PROMPT_PREVIEW_CHARS: usize = 50;

/// One completed analysis, as listed in the history panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Uploaded file name or the remote URL.
    pub file_name: String,
    pub prompt: String,
    pub text: String,
    pub total_cost: f64,
}

impl HistoryEntry {
    /// The prompt cut to [`PROMPT_PREVIEW_CHARS`] characters, with `...`
    /// when something was cut.
    pub fn prompt_preview(&self) -> String {
        let mut chars = self.prompt.chars();
        let head: String = chars.by_ref().take(PROMPT_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Completed analyses in upload order.
#[derive(Debug, Clone, Default)]
pub struct AnalysisHistory {
    entries: Vec<HistoryEntry>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file_name: impl Into<String>, prompt: impl Into<String>, result: &AnalysisResult) {
        self.entries.push(HistoryEntry {
            file_name: file_name.into(),
            prompt: prompt.into(),
            text: result.text.clone(),
            total_cost: result.total_cost,
        });
    }

    /// Most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::UsageMetadata;

    fn result(text: &str, prompt_tokens: u64) -> AnalysisResult {
        AnalysisResult::new(
            text,
            "gemini-2.5-flash",
            &UsageMetadata {
                prompt_token_count: prompt_tokens,
                candidates_token_count: 0,
                total_token_count: prompt_tokens,
            },
        )
    }

    #[test]
    fn recent_is_newest_first() {
        let mut h = AnalysisHistory::new();
        h.record("a.mp4", "p1", &result("first", 10));
        h.record("b.mp4", "p2", &result("second", 20));
        h.record("c.mp4", "p3", &result("third", 30));

        let names: Vec<&str> = h.recent().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.mp4", "b.mp4", "a.mp4"]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn entry_copies_text_and_cost() {
        let mut h = AnalysisHistory::new();
        let r = result("A cat sleeps.", 1_000_000);
        h.record("cat.mov", "What happens?", &r);
        let e = h.recent().next().unwrap();
        assert_eq!(e.text, "A cat sleeps.");
        assert_eq!(e.total_cost, r.total_cost);
    }

    #[test]
    fn clear_empties() {
        let mut h = AnalysisHistory::new();
        h.record("a.mp4", "p", &result("t", 1));
        h.clear();
        assert!(h.is_empty());
    }

    #[test]
    fn prompt_preview_truncates_long_prompts() {
        let long = "x".repeat(80);
        let e = HistoryEntry {
            file_name: "a".into(),
            prompt: long,
            text: String::new(),
            total_cost: 0.0,
        };
        assert_eq!(e.prompt_preview(), format!("{}...", "x".repeat(50)));

        let short = HistoryEntry {
            prompt: "Explain what happens in this video".into(),
            ..e
        };
        assert_eq!(short.prompt_preview(), "Explain what happens in this video");
    }
}
