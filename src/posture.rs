use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Qualitative posture zone for one angle reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureZone {
    TooTight,
    TooWide,
    Correct,
}

/// Display text for each zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLabels {
    pub too_tight: String,
    pub too_wide: String,
    pub correct: String,
}

impl ZoneLabels {
    pub fn get(&self, zone: PostureZone) -> &str {
        match zone {
            PostureZone::TooTight => &self.too_tight,
            PostureZone::TooWide => &self.too_wide,
            PostureZone::Correct => &self.correct,
        }
    }
}

/// Angle bounds in degrees, shared by posture zones and rep hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub zone_labels: ZoneLabels,
}

impl ThresholdPolicy {
    pub fn new(
        lower_bound: f64,
        upper_bound: f64,
        zone_labels: ZoneLabels,
    ) -> Result<Self, ConfigError> {
        let policy = Self {
            lower_bound,
            upper_bound,
            zone_labels,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Bounds must be finite, ordered, and inside the angle range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bounds(self.lower_bound, self.upper_bound)
    }

    pub fn label(&self, zone: PostureZone) -> &str {
        self.zone_labels.get(zone)
    }
}

pub(crate) fn check_bounds(lo: f64, hi: f64) -> Result<(), ConfigError> {
    if !lo.is_finite() || !hi.is_finite() {
        return Err(ConfigError::invalid("threshold bounds must be finite"));
    }
    if lo < 0.0 || hi > 180.0 {
        return Err(ConfigError::invalid(format!(
            "threshold bounds {lo}..{hi} fall outside 0..180 degrees"
        )));
    }
    if lo >= hi {
        return Err(ConfigError::invalid(format!(
            "lower bound {lo} must be below upper bound {hi}"
        )));
    }
    Ok(())
}

/// Maps an angle to its zone. No hysteresis: readings near a bound may
/// flicker between zones frame to frame.
pub fn classify(angle: f64, policy: &ThresholdPolicy) -> PostureZone {
    debug_assert!(angle.is_finite(), "classify called with {angle}");
    if angle < policy.lower_bound {
        PostureZone::TooTight
    } else if angle > policy.upper_bound {
        PostureZone::TooWide
    } else {
        PostureZone::Correct
    }
}
