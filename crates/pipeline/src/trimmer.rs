use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::Instrument;
use trim_transport::{MediaAsset, wire};
use uuid::Uuid;

use crate::{BoundedCopy, TempResource, TrimError, TrimRange};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory temp files are created in.
    pub temp_dir: PathBuf,
    /// Upper bound on one bounded-copy run. The process is killed when it expires.
    pub timeout: Duration,
    /// Content types accepted for trimming, compared without parameters.
    pub accepted_types: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(60),
            accepted_types: vec![wire::MIME_MPEG.to_string()],
        }
    }
}

/// Runs trim jobs. Jobs share nothing but the temp directory, so one
/// `Trimmer` can serve any number of concurrent requests.
pub struct Trimmer {
    copier: Arc<dyn BoundedCopy>,
    config: PipelineConfig,
}

impl Trimmer {
    pub fn new(copier: impl BoundedCopy + 'static, config: PipelineConfig) -> Self {
        Self {
            copier: Arc::new(copier),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = wire::essence(content_type);
        self.config
            .accepted_types
            .iter()
            .any(|accepted| wire::essence(accepted) == essence)
    }

    fn validate(&self, source: &MediaAsset) -> Result<(), TrimError> {
        if source.is_empty() {
            return Err(TrimError::InvalidInput("Audio file is empty".into()));
        }
        if !self.accepts(source.content_type()) {
            return Err(TrimError::InvalidInput(format!(
                "Unsupported audio type: {}",
                source.content_type()
            )));
        }
        Ok(())
    }

    /// Trim raw request values: payload, its content type and the region
    /// bounds as decimal strings.
    pub async fn trim_raw(
        &self,
        bytes: Bytes,
        content_type: &str,
        start_raw: &str,
        end_raw: &str,
    ) -> Result<Bytes, TrimError> {
        let source = MediaAsset::new(bytes, content_type);
        self.validate(&source)?;
        let range = TrimRange::parse(start_raw, end_raw)?;
        self.trim(&source, range).await
    }

    /// Cut `range` out of `source` without re-encoding.
    ///
    /// Input is validated before anything is allocated. Both temp files are
    /// removed on every path out of this function.
    pub async fn trim(&self, source: &MediaAsset, range: TrimRange) -> Result<Bytes, TrimError> {
        self.validate(source)?;

        let job = Uuid::new_v4();
        let span = tracing::info_span!("trim", job = %job.simple());
        let result = self.run(job, source, range).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(bytes) => tracing::info!(
                start = range.start(),
                end = range.end(),
                input_len = source.len(),
                output_len = bytes.len(),
                "trim complete"
            ),
            Err(TrimError::ProcessFailure {
                reason,
                diagnostics,
            }) => tracing::error!(%reason, %diagnostics, "trim failed"),
            Err(e) => tracing::error!(error = %e, "trim failed"),
        });
        result
    }

    async fn run(&self, job: Uuid, source: &MediaAsset, range: TrimRange) -> Result<Bytes, TrimError> {
        let ext = wire::extension_for(source.content_type());
        let input = TempResource::create(&self.config.temp_dir, job, "in", ext)?;
        let output = TempResource::create(&self.config.temp_dir, job, "out", ext)?;

        tokio::fs::write(input.path(), source.bytes()).await?;

        let copy = self.copier.copy(input.path(), output.path(), range);
        match tokio::time::timeout(self.config.timeout, copy).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TrimError::process(
                    format!("timed out after {:?}", self.config.timeout),
                    String::new(),
                ));
            }
        }

        let trimmed = tokio::fs::read(output.path()).await?;
        if trimmed.is_empty() {
            return Err(TrimError::process("bounded copy produced no output", String::new()));
        }

        Ok(Bytes::from(trimmed))
    }
}
