//! Repetition detection by two-threshold hysteresis.
//!
//! A repetition is one full excursion: the angle must drop below the lower
//! bound and then rise above the upper bound. A signal bouncing around only
//! one bound never counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::error::ConfigError;
use crate::posture::{check_bounds, ThresholdPolicy};

/// Phase of the current movement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Extended,
    Bent,
}

/// Mutable per-joint state for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepState {
    pub phase: RepPhase,
    pub completed_count: u32,
}

/// Emitted when a Bent to Extended transition completes a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionEvent {
    pub definition_id: String,
    /// 1-based repetition number for this joint.
    pub index: u32,
    pub timestamp: DateTime<Utc>,
    pub angle_at_trigger: f64,
}

/// Hysteresis detector for one tracked joint angle.
#[derive(Debug, Clone)]
pub struct RepetitionStateMachine {
    definition_id: String,
    lower_bound: f64,
    upper_bound: f64,
    state: RepState,
}

impl RepetitionStateMachine {
    pub fn new(
        definition_id: impl Into<String>,
        policy: &ThresholdPolicy,
    ) -> Result<Self, ConfigError> {
        Self::with_bounds(definition_id, policy.lower_bound, policy.upper_bound)
    }

    /// Fails unless `0 <= lower_bound < upper_bound <= 180`. Equal or
    /// inverted bounds would collapse the hysteresis band.
    pub fn with_bounds(
        definition_id: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self, ConfigError> {
        check_bounds(lower_bound, upper_bound)?;
        Ok(Self {
            definition_id: definition_id.into(),
            lower_bound,
            upper_bound,
            state: RepState::default(),
        })
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn phase(&self) -> RepPhase {
        self.state.phase
    }

    pub fn completed_count(&self) -> u32 {
        self.state.completed_count
    }

    /// Feed one angle reading. Returns the event if this reading completed a
    /// repetition. Non-finite readings leave the state untouched.
    pub fn step(&mut self, angle: f64, timestamp: DateTime<Utc>) -> Option<RepetitionEvent> {
        if !angle.is_finite() {
            return None;
        }

        match self.state.phase {
            RepPhase::Extended if angle < self.lower_bound => {
                trace!(joint = %self.definition_id, angle, "entered bent phase");
                self.state.phase = RepPhase::Bent;
                None
            }
            RepPhase::Bent if angle > self.upper_bound => {
                self.state.phase = RepPhase::Extended;
                self.state.completed_count += 1;
                info!(
                    joint = %self.definition_id,
                    count = self.state.completed_count,
                    angle,
                    "repetition completed"
                );
                Some(RepetitionEvent {
                    definition_id: self.definition_id.clone(),
                    index: self.state.completed_count,
                    timestamp,
                    angle_at_trigger: angle,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn run(angles: &[f64]) -> (RepetitionStateMachine, Vec<(usize, RepetitionEvent)>) {
        let mut machine = RepetitionStateMachine::with_bounds("knee", 70.0, 160.0).unwrap();
        let start = Utc::now();
        let events = angles
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| {
                machine
                    .step(a, start + Duration::milliseconds(33 * i as i64))
                    .map(|e| (i, e))
            })
            .collect();
        (machine, events)
    }

    #[test]
    fn one_full_cycle_counts_once() {
        let (machine, events) = run(&[170.0, 100.0, 60.0, 50.0, 65.0, 100.0, 170.0]);
        assert_eq!(events.len(), 1);
        let (i, event) = &events[0];
        assert_eq!(*i, 6);
        assert_eq!(event.index, 1);
        assert_eq!(event.angle_at_trigger, 170.0);
        assert_eq!(machine.completed_count(), 1);
        assert_eq!(machine.phase(), RepPhase::Extended);
    }

    #[test]
    fn bouncing_near_lower_bound_never_counts() {
        let (machine, events) = run(&[170.0, 65.0, 75.0, 65.0, 75.0, 65.0, 155.0]);
        assert!(events.is_empty());
        assert_eq!(machine.phase(), RepPhase::Bent);
    }

    #[test]
    fn oscillation_then_single_exit() {
        let (machine, events) = run(&[170.0, 65.0, 75.0, 65.0, 75.0, 65.0, 175.0]);
        // one excursion below 70 and one rise above 160: exactly one rep
        assert_eq!(events.len(), 1);
        assert_eq!(machine.completed_count(), 1);
    }

    #[test]
    fn bounds_are_strict() {
        let (machine, events) = run(&[70.0, 160.0, 69.0, 160.0]);
        assert!(events.is_empty());
        assert_eq!(machine.phase(), RepPhase::Bent);
    }

    #[test]
    fn nan_is_noop() {
        let mut machine = RepetitionStateMachine::with_bounds("knee", 70.0, 160.0).unwrap();
        let now = Utc::now();
        machine.step(60.0, now);
        let before = machine.state();
        assert!(machine.step(f64::NAN, now).is_none());
        assert!(machine.step(f64::INFINITY, now).is_none());
        assert_eq!(machine.state(), before);
    }

    #[test]
    fn counts_consecutive_reps_with_indices() {
        let (machine, events) = run(&[170.0, 60.0, 170.0, 60.0, 170.0, 60.0, 170.0]);
        let indices: Vec<u32> = events.iter().map(|(_, e)| e.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(machine.completed_count(), 3);
    }

    #[test]
    fn first_drop_arms_machine() {
        // initial phase is Extended; staying extended never counts
        let (_, events) = run(&[50.0, 170.0]);
        assert_eq!(events.len(), 1);
        let (_, events) = run(&[170.0, 170.0, 170.0]);
        assert!(events.is_empty());
    }

    #[test]
    fn rejects_collapsed_band() {
        assert!(RepetitionStateMachine::with_bounds("knee", 160.0, 70.0).is_err());
        assert!(RepetitionStateMachine::with_bounds("knee", 90.0, 90.0).is_err());
        assert!(RepetitionStateMachine::with_bounds("knee", f64::NAN, 160.0).is_err());
        assert!(RepetitionStateMachine::with_bounds("knee", 70.0, f64::INFINITY).is_err());

        // public fields let a caller skip ThresholdPolicy::new
        let inverted = ThresholdPolicy {
            lower_bound: 160.0,
            upper_bound: 70.0,
            zone_labels: crate::posture::ZoneLabels {
                too_tight: "tight".into(),
                too_wide: "wide".into(),
                correct: "ok".into(),
            },
        };
        assert!(matches!(
            RepetitionStateMachine::new("knee", &inverted),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
