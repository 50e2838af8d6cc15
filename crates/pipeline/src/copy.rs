//! External bounded-copy step.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{TrimError, TrimRange};

/// Lines of tool output kept for diagnostics.
const DIAGNOSTIC_LINES: usize = 20;

/// Copies `range` of the media at `input` into `output` without re-encoding.
///
/// `output` already exists (empty) and may be overwritten. Implementations
/// must not touch any other path.
#[async_trait]
pub trait BoundedCopy: Send + Sync {
    async fn copy(&self, input: &Path, output: &Path, range: TrimRange) -> Result<(), TrimError>;
}

/// [`BoundedCopy`] backed by an `ffmpeg` executable doing a stream copy.
#[derive(Debug, Clone)]
pub struct FfmpegCopy {
    program: PathBuf,
}

impl FfmpegCopy {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that `program` runs, returning the copier and the tool's version line.
    pub async fn detect(program: impl Into<PathBuf>) -> Result<(Self, String), TrimError> {
        let copier = Self::new(program);

        let output = Command::new(&copier.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TrimError::process(
                    format!("cannot run {}: {e}", copier.program.display()),
                    String::new(),
                )
            })?;

        if !output.status.success() {
            return Err(TrimError::process(
                format!("{} -version exited with {}", copier.program.display(), output.status),
                tail(&output.stderr, DIAGNOSTIC_LINES),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().next().unwrap_or_default().trim().to_string();
        Ok((copier, version))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Arguments for a stream copy of `range` from `input` to `output`.
///
/// Seeking happens after the input is opened, so cuts land on the first
/// codec frame boundary at or after `start`.
pub fn ffmpeg_args(input: &Path, output: &Path, range: TrimRange) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());
    args.extend(
        [
            "-ss".to_string(),
            seconds_arg(range.start()),
            "-t".to_string(),
            seconds_arg(range.duration()),
            "-vn".to_string(),
            "-acodec".to_string(),
            "copy".to_string(),
            "-fflags".to_string(),
            "+bitexact".to_string(),
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

fn seconds_arg(seconds: f64) -> String {
    format!("{seconds:.6}")
}

/// Last `lines` lines of process output, lossily decoded.
fn tail(output: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(output);
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[async_trait]
impl BoundedCopy for FfmpegCopy {
    async fn copy(&self, input: &Path, output: &Path, range: TrimRange) -> Result<(), TrimError> {
        tracing::debug!(
            program = %self.program.display(),
            start = range.start(),
            duration = range.duration(),
            "running bounded copy"
        );

        // Dropping this future (e.g. on timeout) kills the child.
        let result = Command::new(&self.program)
            .args(ffmpeg_args(input, output, range))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TrimError::process(
                    format!("failed to start {}: {e}", self.program.display()),
                    String::new(),
                )
            })?;

        if !result.status.success() {
            return Err(TrimError::process(
                format!("{} exited with {}", self.program.display(), result.status),
                tail(&result.stderr, DIAGNOSTIC_LINES),
            ));
        }

        Ok(())
    }
}
