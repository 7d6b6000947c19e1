use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::landmark::{Frame, Landmark, LandmarkRole, LANDMARK_COUNT};

/// Handle to the external pose-estimation model.
///
/// Sessions never own a model; callers pass one into
/// [`ExerciseSession::process_with`](crate::tracker::ExerciseSession::process_with).
pub trait PoseEstimator {
    type Input;

    fn estimate(&mut self, input: &Self::Input) -> Result<Frame, EstimatorError>;
}

/// Raw model output for one frame: one row per landmark in model order.
///
/// Rows are `[x, y]`, `[x, y, z]` or `[x, y, z, visibility]`. An empty list
/// means no pose was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPose {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub landmarks: Vec<Vec<f32>>,
}

/// Decodes recorded raw model rows into frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedPose;

impl RecordedPose {
    pub fn new() -> Self {
        Self
    }

    fn decode_row(row: &[f32]) -> Option<Landmark> {
        let x = *row.first()?;
        let y = *row.get(1)?;
        // depth at index 2 is not used
        let visibility = row.get(3).copied().unwrap_or(1.0);
        Some(Landmark::new(x, y, visibility))
    }
}

impl PoseEstimator for RecordedPose {
    type Input = RawPose;

    fn estimate(&mut self, input: &RawPose) -> Result<Frame, EstimatorError> {
        if input.landmarks.len() > LANDMARK_COUNT {
            return Err(EstimatorError::TooManyLandmarks {
                max: LANDMARK_COUNT,
                got: input.landmarks.len(),
            });
        }

        let landmarks = input
            .landmarks
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let role = LandmarkRole::from_index(i)?;
                Self::decode_row(row).map(|lm| (role, lm))
            })
            .collect();

        Ok(Frame {
            timestamp: input.timestamp,
            landmarks,
        })
    }
}
