pub mod wire;

use bytes::Bytes;

/// Decoded, interleaved PCM audio.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    /// Get the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Get the duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// An immutable audio byte sequence with its content type and, once decoded,
/// its duration in seconds.
///
/// Cloning is cheap: the bytes are reference counted. A trim never mutates
/// its source, it produces a new asset.
#[derive(Clone, PartialEq)]
pub struct MediaAsset {
    bytes: Bytes,
    content_type: String,
    duration: Option<f64>,
}

impl MediaAsset {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            duration: None,
        }
    }

    /// Attach a decoded duration. Negative or non-finite values are stored as zero.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(if seconds.is_finite() { seconds.max(0.0) } else { 0.0 });
        self
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAsset")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("duration", &self.duration)
            .finish()
    }
}

/// Commands sent from the controller to the playback engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Seek { seconds: f64 },
    SetVolume(f32),
}

/// Status reported by the playback engine, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    /// Decoding finished and the duration is known.
    MetadataReady(f64),
    /// Current playback position in seconds.
    Progress(f64),
    /// Playback ran off the end of the asset.
    Ended,
}
