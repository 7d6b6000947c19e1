//! Per-frame orchestration for one exercise session.
//!
//! Each frame flows one way: landmarks -> joint angle -> {posture zone,
//! hysteresis step} -> aggregator. Frames must arrive in strictly increasing
//! timestamp order; instances share no state with each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::{Config, ExerciseConfig};
use crate::definition::JointAngleDefinition;
use crate::error::{ConfigError, Error, Result, SessionError};
use crate::inference::PoseEstimator;
use crate::landmark::Frame;
use crate::posture::{classify, PostureZone, ThresholdPolicy};
use crate::reps::{RepetitionEvent, RepetitionStateMachine};
use crate::session::{AngleSample, SessionAggregator, SessionId, SessionRecord};

/// Display-ready reading for one joint in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointFeedback {
    pub definition_id: String,
    pub angle: Option<f64>,
    pub zone: Option<PostureZone>,
    pub label: Option<String>,
    /// Cumulative repetitions for this joint, including this frame.
    pub reps: u32,
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFeedback {
    pub timestamp: DateTime<Utc>,
    pub joints: Vec<JointFeedback>,
    pub events: Vec<RepetitionEvent>,
}

impl FrameFeedback {
    /// First configured joint, the one shown on a single-line overlay.
    pub fn primary(&self) -> Option<&JointFeedback> {
        self.joints.first()
    }
}

struct TrackedJoint {
    definition: JointAngleDefinition,
    machine: RepetitionStateMachine,
}

/// One isolated tracking session for a single exercise.
pub struct ExerciseSession {
    exercise: String,
    confidence_floor: f32,
    policy: ThresholdPolicy,
    joints: Vec<TrackedJoint>,
    aggregator: SessionAggregator,
    last_timestamp: Option<DateTime<Utc>>,
    frames_seen: u64,
    frames_skipped: u64,
}

impl ExerciseSession {
    /// Open a session for `exercise` as configured in `config`.
    pub fn start(config: &Config, exercise: &str, start_time: DateTime<Utc>) -> Result<Self> {
        let exercise_config = config.exercise(exercise)?;
        Self::from_parts(exercise, exercise_config, config.confidence_floor, start_time)
    }

    /// Open a session from an exercise config that has not been through
    /// [`Config::validate`]. Applies the same checks.
    pub fn from_parts(
        exercise: &str,
        exercise_config: &ExerciseConfig,
        confidence_floor: f32,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence_floor) {
            return Err(ConfigError::invalid(format!(
                "confidence_floor {confidence_floor} must be within 0..=1"
            ))
            .into());
        }
        exercise_config.validate(exercise)?;
        let policy = exercise_config.policy()?;
        let joints = exercise_config
            .definitions(exercise)
            .into_iter()
            .map(|definition| {
                Ok(TrackedJoint {
                    machine: RepetitionStateMachine::new(definition.id.clone(), &policy)?,
                    definition,
                })
            })
            .collect::<std::result::Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            exercise: exercise.to_string(),
            confidence_floor,
            policy,
            joints,
            aggregator: SessionAggregator::open_session(start_time),
            last_timestamp: None,
            frames_seen: 0,
            frames_skipped: 0,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.aggregator.session_id()
    }

    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Total repetitions across all joints so far.
    pub fn total_reps(&self) -> u32 {
        self.joints.iter().map(|j| j.machine.completed_count()).sum()
    }

    pub fn reps_for(&self, definition_id: &str) -> Option<u32> {
        self.joints
            .iter()
            .find(|j| j.definition.id == definition_id)
            .map(|j| j.machine.completed_count())
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Frames that yielded no sample for at least one joint.
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Run the injected estimator on `input` and process the resulting frame.
    pub fn process_with<E: PoseEstimator>(
        &mut self,
        estimator: &mut E,
        input: &E::Input,
    ) -> Result<FrameFeedback> {
        let frame = estimator.estimate(input)?;
        self.process_frame(&frame)
    }

    /// Process one frame for every tracked joint.
    ///
    /// Missing landmarks and collapsed geometry skip that joint for this
    /// frame only. Lifecycle and ordering violations are returned as errors.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameFeedback> {
        if !self.aggregator.is_open() {
            return Err(SessionError::closed("open session to process frames").into());
        }
        if let Some(previous) = self.last_timestamp {
            if frame.timestamp <= previous {
                warn!(%previous, received = %frame.timestamp, "rejecting out-of-order frame");
                return Err(SessionError::OutOfOrderFrame {
                    previous,
                    received: frame.timestamp,
                }
                .into());
            }
        }
        self.last_timestamp = Some(frame.timestamp);
        self.frames_seen += 1;

        let mut feedback = FrameFeedback {
            timestamp: frame.timestamp,
            joints: Vec::with_capacity(self.joints.len()),
            events: Vec::new(),
        };
        let mut skipped = false;

        for joint in &mut self.joints {
            let id = &joint.definition.id;
            let angle = match joint.definition.measure(frame, self.confidence_floor) {
                Ok(angle) => angle,
                Err(reason) => {
                    debug!(joint = %id, %reason, "no sample this frame");
                    skipped = true;
                    feedback.joints.push(JointFeedback {
                        definition_id: id.clone(),
                        angle: None,
                        zone: None,
                        label: None,
                        reps: joint.machine.completed_count(),
                    });
                    continue;
                }
            };
            trace!(joint = %id, angle, "angle sample");

            self.aggregator.record_sample(AngleSample {
                definition_id: id.clone(),
                value_degrees: angle,
                timestamp: frame.timestamp,
            })?;

            let zone = classify(angle, &self.policy);
            if let Some(event) = joint.machine.step(angle, frame.timestamp) {
                self.aggregator.record_event(event.clone())?;
                feedback.events.push(event);
            }

            feedback.joints.push(JointFeedback {
                definition_id: id.clone(),
                angle: Some(angle),
                zone: Some(zone),
                label: Some(self.policy.label(zone).to_string()),
                reps: joint.machine.completed_count(),
            });
        }

        if skipped {
            self.frames_skipped += 1;
        }
        Ok(feedback)
    }

    /// Close the session and hand out its record. Fails if already closed.
    pub fn finish(&mut self, end_time: DateTime<Utc>) -> Result<SessionRecord> {
        self.aggregator.close_session(end_time).map_err(Error::from)
    }
}
