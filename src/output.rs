//! The value returned by a successful analysis.

use crate::cost::estimate_cost;
use crate::service::UsageMetadata;
use serde::{Deserialize, Serialize};

/// Generated description plus token usage and estimated cost.
///
/// Built once per successful analysis by [`AnalysisResult::new`]; the fields
/// are public for reading and serialisation but the cost fields are always
/// derived from the token counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The model's answer to the prompt.
    pub text: String,
    /// Model that produced the answer.
    pub model: String,
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    /// As reported by the service; normally `prompt_tokens + response_tokens`.
    pub total_tokens: u64,
    /// Estimated USD for the prompt tokens.
    pub input_cost: f64,
    /// Estimated USD for the response tokens.
    pub output_cost: f64,
    /// `input_cost + output_cost`.
    pub total_cost: f64,
}

impl AnalysisResult {
    pub fn new(text: impl Into<String>, model: impl Into<String>, usage: &UsageMetadata) -> Self {
        let cost = estimate_cost(usage.prompt_token_count, usage.candidates_token_count);
        Self {
            text: text.into(),
            model: model.into(),
            prompt_tokens: usage.prompt_token_count,
            response_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
            input_cost: cost.input,
            output_cost: cost.output,
            total_cost: cost.total,
        }
    }
}
