//! Job-scoped temporary files.

use std::io;
use std::path::Path;

use tempfile::TempPath;
use uuid::Uuid;

/// A temporary file owned by one trim job, deleted when dropped.
///
/// Names follow `trim-<unix-millis>-<job>-<role>-<random>.<ext>` and are
/// created with create-new semantics, so two jobs never share a file even
/// when their timestamps collide.
#[derive(Debug)]
pub struct TempResource {
    path: Option<TempPath>,
}

impl TempResource {
    pub fn create(dir: &Path, job: Uuid, role: &str, ext: &str) -> io::Result<Self> {
        let prefix = format!(
            "trim-{}-{}-{}-",
            chrono::Utc::now().timestamp_millis(),
            job.simple(),
            role
        );
        let suffix = format!(".{ext}");

        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(6)
            .tempfile_in(dir)?;

        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    /// Delete the file now and report the outcome. A file that is already
    /// gone counts as deleted.
    pub fn release(mut self) -> io::Result<()> {
        match self.path.take() {
            Some(path) => ignore_missing(path.close()),
            None => Ok(()),
        }
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let location = path.to_path_buf();
        if let Err(e) = ignore_missing(path.close()) {
            tracing::warn!(path = %location.display(), error = %e, "failed to remove temp file");
        }
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
