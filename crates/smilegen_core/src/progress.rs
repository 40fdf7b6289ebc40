use std::time::{Duration, Instant};

/// Fraction of the remaining gap covered on each tick.
pub const EASING_FACTOR: f64 = 0.1;
/// Distance below which the displayed value snaps onto the target.
pub const SNAP_EPSILON: f64 = 0.1;

/// Smoothed 0-100 progress with a best-effort remaining-time estimate.
///
/// Callers push coarse checkpoints with [`ProgressState::set_target`]; the host
/// drives [`ProgressState::tick`] at its frame rate so the displayed value eases
/// toward the latest checkpoint instead of jumping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    current: f64,
    target: f64,
    label: String,
    started_at: Option<Instant>,
    estimated_duration: Option<Duration>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new checkpoint. A duration hint restarts the estimate's clock at `now`.
    pub fn set_target(
        &mut self,
        percent: f64,
        label: impl Into<String>,
        estimated_duration: Option<Duration>,
        now: Instant,
    ) {
        self.target = clamp_percent(percent);
        self.label = label.into();
        if estimated_duration.is_some() {
            self.estimated_duration = estimated_duration;
            self.started_at = Some(now);
        }
    }

    /// Advances the displayed value one frame. Returns `true` while still moving.
    pub fn tick(&mut self) -> bool {
        let diff = self.target - self.current;
        if diff.abs() < SNAP_EPSILON {
            self.current = self.target;
            return false;
        }
        self.current = clamp_percent(self.current + diff * EASING_FACTOR);
        (self.target - self.current).abs() >= SNAP_EPSILON
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn estimated_duration(&self) -> Option<Duration> {
        self.estimated_duration
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Extrapolates the remaining time from the elapsed time and the displayed percent.
    ///
    /// Returns `None` before a start reference was recorded or while nothing is displayed.
    pub fn estimate_remaining(&self, now: Instant) -> Option<Duration> {
        let started_at = self.started_at?;
        remaining_from(now.saturating_duration_since(started_at), self.current)
    }

    /// One-line time hint for the progress display.
    pub fn status_line(&self, now: Instant) -> Option<String> {
        let remaining = self.estimate_remaining(now)?;
        if remaining.is_zero() {
            Some("Almost done...".to_string())
        } else {
            Some(format!(
                "Estimated remaining: {}",
                crate::format_duration(remaining.as_secs_f64())
            ))
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Linear extrapolation: `total = elapsed / percent * 100`, remaining `max(0, total - elapsed)`.
pub fn remaining_from(elapsed: Duration, percent: f64) -> Option<Duration> {
    let percent = clamp_percent(percent);
    if percent <= 0.0 {
        return None;
    }
    let elapsed_secs = elapsed.as_secs_f64();
    let total = elapsed_secs / percent * 100.0;
    Some(Duration::from_secs_f64((total - elapsed_secs).max(0.0)))
}

/// Clamps into `[0, 100]`; NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
