/// Failure of one trim job.
#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    /// Payload empty or of a type the pipeline does not accept.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidRange(String),

    /// The bounded copy failed to start, exited non-zero, timed out or
    /// produced nothing. `diagnostics` holds the tool's own output and is
    /// meant for logs, not for callers.
    #[error("bounded copy failed: {reason}")]
    ProcessFailure { reason: String, diagnostics: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrimError {
    pub(crate) fn process(reason: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::ProcessFailure {
            reason: reason.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Whether the caller sent something unusable, as opposed to the job failing.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidRange(_))
    }
}
