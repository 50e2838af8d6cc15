//! Wire contract between the browser-side controller and the trim endpoint.
//!
//! A trim request is a multipart `POST` carrying the audio payload and the
//! region bounds as decimal strings. A successful response is the trimmed
//! audio as an attachment; failures carry an [`ErrorBody`].

use serde::{Deserialize, Serialize};

/// Route the trim endpoint is mounted on.
pub const TRIM_PATH: &str = "/api/trim-audio";

/// Multipart field holding the uploaded audio.
pub const FIELD_AUDIO: &str = "audio";
/// Multipart field holding the region start, in seconds.
pub const FIELD_START_TIME: &str = "startTime";
/// Multipart field holding the region end, in seconds.
pub const FIELD_END_TIME: &str = "endTime";

/// Response header carrying the probed duration of the trimmed output.
pub const TRIMMED_DURATION_HEADER: &str = "x-trimmed-duration";

pub const MIME_MPEG: &str = "audio/mpeg";

/// Error payload returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// File extension used for temporary files and download names of an audio type.
///
/// Parameters such as `; charset=` are ignored. Unknown types fall back to `bin`.
pub fn extension_for(content_type: &str) -> &'static str {
    match essence(content_type).as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/ogg" => "ogg",
        "audio/aac" => "aac",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        _ => "bin",
    }
}

/// The bare `type/subtype` of a content type, lowercased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Download filename offered for a trimmed asset of the given type.
pub fn download_filename(content_type: &str) -> String {
    format!("trimmed.{}", extension_for(content_type))
}

/// Value of the `Content-Disposition` header for a trimmed asset.
pub fn content_disposition(content_type: &str) -> String {
    format!(
        "attachment; filename=\"{}\"",
        download_filename(content_type)
    )
}
