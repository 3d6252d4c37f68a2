//! Pipeline stages for video analysis.
//!
//! Each submodule implements exactly one step, so each can be tested against
//! a scripted [`crate::service::MediaService`] without the others.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ submit ──▶ poll ──▶ generate
//! (classify)  (upload)   (wait)   (prompt + cost)
//! ```
//!
//! 1. [`source`]  : YouTube link or local path; MIME type from extension
//! 2. [`submit`]  : reference the link, or check and upload the file
//! 3. [`poll`]    : re-read the upload until it leaves `PROCESSING`
//! 4. [`generate`]: one generate call, priced into an [`crate::AnalysisResult`]

pub mod generate;
pub mod poll;
pub mod source;
pub mod submit;
