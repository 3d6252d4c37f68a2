//! Token-usage cost estimate.
//!
//! Prices are a fixed point-in-time sheet for `gemini-2.5-flash` text/image
//! input and non-thinking output. They are applied to every model, so the
//! estimate is only accurate for the default model.

use serde::{Deserialize, Serialize};

/// USD per one million prompt (input) tokens.
pub const INPUT_USD_PER_MILLION: f64 = 0.15;

/// USD per one million response (output) tokens.
pub const OUTPUT_USD_PER_MILLION: f64 = 0.60;

/// Estimated spend for one request, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

/// Price a request from its token counts.
pub fn estimate_cost(prompt_tokens: u64, response_tokens: u64) -> CostEstimate {
    let input = prompt_tokens as f64 / 1_000_000.0 * INPUT_USD_PER_MILLION;
    let output = response_tokens as f64 / 1_000_000.0 * OUTPUT_USD_PER_MILLION;
    CostEstimate {
        input,
        output,
        total: input + output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12_f64.max(b.abs() * 1e-12)
    }

    #[test]
    fn thousand_in_five_hundred_out() {
        let c = estimate_cost(1000, 500);
        assert!(close(c.input, 0.000150), "got {}", c.input);
        assert!(close(c.output, 0.000300), "got {}", c.output);
        assert!(close(c.total, 0.000450), "got {}", c.total);
        assert_eq!(format!("{:.6}", c.total), "0.000450");
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        assert_eq!(estimate_cost(0, 0), CostEstimate::default());
    }

    #[test]
    fn components_are_linear_and_sum_to_total() {
        for (p, r) in [(1, 0), (0, 1), (7, 13), (258_000, 1_234), (10_000_000, 3_000_000)] {
            let c = estimate_cost(p, r);
            assert!(close(c.input, p as f64 * 1.5e-7), "input for p={p}");
            assert!(close(c.output, r as f64 * 6.0e-7), "output for r={r}");
            assert_eq!(c.total, c.input + c.output);
        }
    }
}
