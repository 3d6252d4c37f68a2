//! Default prompt and model identifiers.
//!
//! Kept in one place so the CLI defaults, the browser form and the library
//! defaults cannot drift apart.

/// Prompt used when the caller does not supply one.
pub const DEFAULT_PROMPT: &str = "Explain what happens in this video";

/// Model used when the caller does not supply one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Models offered by the browser model selector, default first.
pub const SUPPORTED_MODELS: [&str; 3] = ["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-pro"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_first_supported() {
        assert_eq!(SUPPORTED_MODELS[0], DEFAULT_MODEL);
    }
}
