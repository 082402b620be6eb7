//! Linear freshness decay.

use chrono::{DateTime, Utc};
use garden_rs_config::{DEFAULT_DECAY_WINDOW_MS, DecayConfig};
use garden_rs_protocol::MemoryRecord;

/// Opacity of a memory last freshened at `freshness`, observed at `now`.
///
/// `1 - (now - freshness) / window`. The value is not clamped:
/// it exceeds 1 for future timestamps and goes negative once
/// the window has passed. Callers decide how to render out-of-range values.
pub fn opacity(freshness: DateTime<Utc>, now: DateTime<Utc>, window_ms: u64) -> f64 {
    let elapsed_ms = (now - freshness).num_milliseconds() as f64;
    1.0 - elapsed_ms / window_ms as f64
}

/// Decay parameters bound to a fade window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayModel {
    window_ms: u64,
}

impl Default for DecayModel {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_WINDOW_MS)
    }
}

impl DecayModel {
    /// Create a model for the given window; a zero window is raised to 1 ms.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
        }
    }

    pub fn from_config(config: &DecayConfig) -> Self {
        Self::new(config.window_ms)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn opacity(&self, freshness: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        opacity(freshness, now, self.window_ms)
    }

    /// Opacity of a record; records without a readable timestamp stay opaque.
    pub fn record_opacity(&self, record: &MemoryRecord, now: DateTime<Utc>) -> f64 {
        record
            .freshness()
            .map_or(1.0, |freshness| self.opacity(freshness, now))
    }
}

/// Whether a marker with this opacity is drawn at all.
pub fn is_visible(opacity: f64) -> bool {
    opacity > 0.0
}

/// Clamp an opacity to the range a renderer can use.
pub fn render_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn half_window_is_half_opacity() {
        let model = DecayModel::default();
        let now = start() + Duration::milliseconds(1_814_000_000);
        assert_eq!(model.opacity(start(), now), 0.5);
    }

    #[test]
    fn fresh_is_fully_opaque() {
        let model = DecayModel::default();
        assert_eq!(model.opacity(start(), start()), 1.0);
    }

    #[test]
    fn decreases_monotonically_with_age() {
        let model = DecayModel::default();
        let mut previous = f64::INFINITY;
        for days in 0..60 {
            let value = model.opacity(start(), start() + Duration::days(days));
            assert!(value < previous, "day {days}: {value} >= {previous}");
            previous = value;
        }
    }

    #[test]
    fn out_of_range_values_are_not_clamped() {
        let model = DecayModel::default();
        let old = model.opacity(start(), start() + Duration::days(84));
        assert!(old < 0.0);
        assert!(!is_visible(old));
        assert_eq!(render_opacity(old), 0.0);

        let future = model.opacity(start() + Duration::days(7), start());
        assert!(future > 1.0);
        assert_eq!(render_opacity(future), 1.0);
    }

    #[test]
    fn custom_window_scales_decay() {
        let model = DecayModel::new(1_000);
        assert_eq!(model.opacity(start(), start() + Duration::milliseconds(250)), 0.75);
        assert_eq!(DecayModel::new(0).window_ms(), 1);
    }
}
