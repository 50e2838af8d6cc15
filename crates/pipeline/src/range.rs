use crate::TrimError;

/// Validated trim bounds in seconds: finite, non-negative, `end > start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    start: f64,
    end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Result<Self, TrimError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(TrimError::InvalidRange(
                "Start and end times must be finite numbers".into(),
            ));
        }
        if start < 0.0 || end < 0.0 {
            return Err(TrimError::InvalidRange(
                "Start and end times must not be negative".into(),
            ));
        }
        if end <= start {
            return Err(TrimError::InvalidRange(
                "End time must be greater than start time".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse the decimal strings carried by a trim request.
    pub fn parse(start_raw: &str, end_raw: &str) -> Result<Self, TrimError> {
        let start = parse_seconds(start_raw)?;
        let end = parse_seconds(end_raw)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

fn parse_seconds(raw: &str) -> Result<f64, TrimError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| TrimError::InvalidRange(format!("Invalid time value: {raw:?}")))
}
