//! Time and region value types. Pure functions only.
//!
//! All times are floating-point seconds. Bound comparisons are strict and
//! made against the current opposite bound, without an epsilon: the values
//! come from interactive sliders and are compared exactly as entered.

/// Identity of a region on the selection surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("region bound is not a finite number")]
    NotFinite,

    #[error("region [{start}, {end}] is empty or inverted")]
    Degenerate { start: f64, end: f64 },
}

/// A `[start, end]` window in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimRegion {
    pub start: f64,
    pub end: f64,
}

impl TrimRegion {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The whole clip selected.
    pub fn whole(duration: f64) -> Self {
        Self::new(0.0, duration.max(0.0))
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.start < self.end)
    }

    /// Move the start bound. The value is clamped into `[0, duration]` and must
    /// stay strictly below the current end.
    pub fn with_start(self, value: f64, duration: f64) -> Result<Self, RegionError> {
        let start = clamp_time(value, duration)?;
        if start >= self.end {
            return Err(RegionError::Degenerate {
                start,
                end: self.end,
            });
        }
        Ok(Self { start, ..self })
    }

    /// Move the end bound. The value is clamped into `[0, duration]` and must
    /// stay strictly above the current start.
    pub fn with_end(self, value: f64, duration: f64) -> Result<Self, RegionError> {
        let end = clamp_time(value, duration)?;
        if end <= self.start {
            return Err(RegionError::Degenerate {
                start: self.start,
                end,
            });
        }
        Ok(Self { end, ..self })
    }
}

fn clamp_time(value: f64, duration: f64) -> Result<f64, RegionError> {
    if !value.is_finite() || !duration.is_finite() {
        return Err(RegionError::NotFinite);
    }
    Ok(value.clamp(0.0, duration.max(0.0)))
}

/// Clamp both bounds of `region` into `[0, duration]`.
///
/// Bounds are never swapped: if the clamped region is empty or inverted the
/// region is rejected and the caller keeps whatever it had before. Every `Ok`
/// satisfies `0 <= start < end <= duration`, which means a zero-length asset
/// has no valid region at all.
pub fn clamp_region(region: TrimRegion, duration: f64) -> Result<TrimRegion, RegionError> {
    let start = clamp_time(region.start, duration)?;
    let end = clamp_time(region.end, duration)?;

    if start >= end {
        return Err(RegionError::Degenerate { start, end });
    }

    Ok(TrimRegion { start, end })
}

/// Format seconds as `M:SS` for display.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
