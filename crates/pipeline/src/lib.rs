//! Trim execution pipeline: validate a request, stage the payload in job-owned
//! temp files, run a bounded copy over it and hand back the result.

mod copy;
mod error;
mod range;
mod temp;
mod trimmer;

pub use copy::{BoundedCopy, FfmpegCopy, ffmpeg_args};
pub use error::TrimError;
pub use range::TrimRange;
pub use temp::TempResource;
pub use trimmer::{PipelineConfig, Trimmer};
