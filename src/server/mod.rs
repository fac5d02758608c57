//! HTTP server providing the mock OpenAI-compatible API.
//!
//! - [`api`]: Request/response types and JSON route handlers
//! - [`uploads`]: Multipart endpoints (audio, files)
//! - [`streaming`]: SSE chunk emitter for streamed chat completions

pub mod api;
pub mod streaming;
pub mod uploads;

/// Current time as seconds since the Unix epoch, for `created` fields.
pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
