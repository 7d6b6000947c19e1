//! Joint angle definitions: which three landmarks form the angle measured
//! for an exercise.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::angle::try_joint_angle;
use crate::error::{ConfigError, FrameSkip};
use crate::landmark::{Frame, LandmarkRole};

/// The included angle at `role_b` between `role_a` and `role_c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointAngleDefinition {
    pub id: String,
    pub role_a: LandmarkRole,
    pub role_b: LandmarkRole,
    pub role_c: LandmarkRole,
    pub exercise: String,
}

impl JointAngleDefinition {
    pub fn new(
        id: impl Into<String>,
        [role_a, role_b, role_c]: [LandmarkRole; 3],
        exercise: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role_a,
            role_b,
            role_c,
            exercise: exercise.into(),
        }
    }

    pub fn roles(&self) -> [LandmarkRole; 3] {
        [self.role_a, self.role_b, self.role_c]
    }

    /// Angle for this joint in `frame`, or the reason there is none.
    pub fn measure(&self, frame: &Frame, confidence_floor: f32) -> Result<f64, FrameSkip> {
        let [a, b, c] = frame.resolve(self.roles(), confidence_floor)?;
        try_joint_angle(a, b, c)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::invalid(format!(
                "exercise '{}' has a joint with an empty id",
                self.exercise
            )));
        }
        let [a, b, c] = self.roles();
        if a == b || b == c || a == c {
            return Err(ConfigError::invalid(format!(
                "joint '{}' of '{}' repeats a landmark role",
                self.id, self.exercise
            )));
        }
        Ok(())
    }
}

/// Static registry of joint definitions, grouped by exercise.
#[derive(Debug, Clone, Default)]
pub struct JointRegistry {
    by_exercise: BTreeMap<String, Vec<JointAngleDefinition>>,
}

impl JointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Ids must be unique within an exercise.
    pub fn register(&mut self, definition: JointAngleDefinition) -> Result<(), ConfigError> {
        definition.validate()?;
        let joints = self.by_exercise.entry(definition.exercise.clone()).or_default();
        if joints.iter().any(|d| d.id == definition.id) {
            return Err(ConfigError::invalid(format!(
                "duplicate joint id '{}' in exercise '{}'",
                definition.id, definition.exercise
            )));
        }
        joints.push(definition);
        Ok(())
    }

    pub fn definitions_for(&self, exercise: &str) -> Option<&[JointAngleDefinition]> {
        self.by_exercise.get(exercise).map(Vec::as_slice)
    }

    pub fn exercises(&self) -> impl Iterator<Item = &str> {
        self.by_exercise.keys().map(String::as_str)
    }

    /// Every landmark role referenced by any definition of `exercise`.
    pub fn required_roles(&self, exercise: &str) -> HashSet<LandmarkRole> {
        self.definitions_for(exercise)
            .unwrap_or_default()
            .iter()
            .flat_map(JointAngleDefinition::roles)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_exercise.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
