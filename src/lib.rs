//! rep-sentinel: joint-angle analytics and repetition counting over pose
//! landmark streams.
//!
//! # Pipeline
//!
//! Each frame of landmarks from an external pose estimator flows one way:
//!
//! 1. **Angle** ([`angle::joint_angle`]): included angle at a vertex landmark,
//!    per configured [`JointAngleDefinition`].
//! 2. **Posture** ([`posture::classify`]): immediate too-tight / too-wide /
//!    correct zone against the exercise's [`ThresholdPolicy`].
//! 3. **Repetitions** ([`RepetitionStateMachine`]): two-threshold hysteresis
//!    that emits one [`RepetitionEvent`] per full bend-and-extend cycle.
//! 4. **Aggregation** ([`SessionAggregator`]): append-only samples and events,
//!    frozen into a [`SessionRecord`] on close and exported as CSV.
//!
//! [`ExerciseSession`] wires these together for one exercise.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use rep_sentinel::{Config, ExerciseSession, Frame, Landmark, LandmarkRole};
//!
//! let config = Config::from_toml_str(r#"
//!     confidence_floor = 0.5
//!     [exercises.squat]
//!     lower_bound = 70.0
//!     upper_bound = 160.0
//!     zone_labels = { too_tight = "Too tight", too_wide = "Too wide", correct = "Correct" }
//!     joints = [
//!         { id = "left_knee", role_a = "left_hip", role_b = "left_knee", role_c = "left_ankle" },
//!     ]
//! "#).unwrap();
//!
//! let t0 = Utc::now();
//! let mut session = ExerciseSession::start(&config, "squat", t0).unwrap();
//!
//! let frame = Frame::empty(t0 + Duration::milliseconds(33))
//!     .with_landmark(LandmarkRole::LeftHip, Landmark::new(0.5, 0.3, 0.9))
//!     .with_landmark(LandmarkRole::LeftKnee, Landmark::new(0.5, 0.5, 0.9))
//!     .with_landmark(LandmarkRole::LeftAnkle, Landmark::new(0.5, 0.7, 0.9));
//! let feedback = session.process_frame(&frame).unwrap();
//! assert_eq!(feedback.joints[0].label.as_deref(), Some("Too wide"));
//!
//! let record = session.finish(t0 + Duration::seconds(1)).unwrap();
//! assert_eq!(record.final_count, 0);
//! ```

pub mod angle;
pub mod capture;
pub mod config;
pub mod definition;
pub mod error;
pub mod export;
pub mod inference;
pub mod landmark;
pub mod overlay;
pub mod posture;
pub mod reps;
pub mod session;
pub mod summary;
pub mod tracker;

pub use angle::{joint_angle, try_joint_angle};
pub use capture::FrameSource;
pub use config::{Config, ExerciseConfig, JointConfig};
pub use definition::{JointAngleDefinition, JointRegistry};
pub use error::{
    ConfigError, Error, EstimatorError, ExportError, FrameSkip, Result, SessionError,
};
pub use inference::{PoseEstimator, RawPose, RecordedPose};
pub use landmark::{Frame, Landmark, LandmarkRole, Point2};
pub use overlay::{ChannelSink, FeedbackSink, LogSink};
pub use posture::{classify, PostureZone, ThresholdPolicy, ZoneLabels};
pub use reps::{RepPhase, RepState, RepetitionEvent, RepetitionStateMachine};
pub use session::{AngleSample, SessionAggregator, SessionId, SessionRecord};
pub use summary::SessionSummary;
pub use tracker::{ExerciseSession, FrameFeedback, JointFeedback};
