//! Landmark and frame types consumed from the pose estimator.
//!
//! Coordinates are normalized image-plane positions in `[0, 1] x [0, 1]`.
//! Depth is dropped at the estimator boundary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FrameSkip;

/// Number of landmarks produced by the BlazePose topology.
pub const LANDMARK_COUNT: usize = 33;

/// Anatomical reference points, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkRole {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkRole {
    pub const ALL: [LandmarkRole; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Role for a raw model output row, if the index is in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 2D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One detected body point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    pub fn point(&self) -> Point2 {
        Point2::new(f64::from(self.x), f64::from(self.y))
    }

    /// A NaN visibility never passes the floor.
    pub fn is_visible(&self, floor: f32) -> bool {
        self.visibility >= floor
    }
}

/// Landmarks detected in one video frame. Empty when no pose was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp: DateTime<Utc>,
    pub landmarks: HashMap<LandmarkRole, Landmark>,
}

impl Frame {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            landmarks: HashMap::new(),
        }
    }

    pub fn with_landmark(mut self, role: LandmarkRole, landmark: Landmark) -> Self {
        self.landmarks.insert(role, landmark);
        self
    }

    pub fn has_pose(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// Position of `role` if present and at or above the visibility floor.
    pub fn visible(&self, role: LandmarkRole, floor: f32) -> Option<Point2> {
        self.landmarks
            .get(&role)
            .filter(|lm| lm.is_visible(floor))
            .map(Landmark::point)
    }

    /// Resolve an ordered set of roles, reporting every role that is absent.
    pub fn resolve<const N: usize>(
        &self,
        roles: [LandmarkRole; N],
        floor: f32,
    ) -> Result<[Point2; N], FrameSkip> {
        let mut points = [Point2::new(0.0, 0.0); N];
        let mut missing = Vec::new();
        for (slot, role) in points.iter_mut().zip(roles) {
            match self.visible(role, floor) {
                Some(p) => *slot = p,
                None => missing.push(role),
            }
        }
        if missing.is_empty() {
            Ok(points)
        } else {
            Err(FrameSkip::IncompleteLandmarks { missing })
        }
    }
}
