use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::definition::{JointAngleDefinition, JointRegistry};
use crate::error::ConfigError;
use crate::landmark::LandmarkRole;
use crate::posture::{ThresholdPolicy, ZoneLabels};

/// One `[[exercises.<name>.joints]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointConfig {
    pub id: String,
    pub role_a: LandmarkRole,
    pub role_b: LandmarkRole,
    pub role_c: LandmarkRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub zone_labels: ZoneLabels,
    pub joints: Vec<JointConfig>,
}

impl ExerciseConfig {
    pub fn policy(&self) -> Result<ThresholdPolicy, ConfigError> {
        ThresholdPolicy::new(self.lower_bound, self.upper_bound, self.zone_labels.clone())
    }

    pub fn definitions(&self, exercise: &str) -> Vec<JointAngleDefinition> {
        self.joints
            .iter()
            .map(|j| {
                JointAngleDefinition::new(j.id.clone(), [j.role_a, j.role_b, j.role_c], exercise)
            })
            .collect()
    }

    /// Bounds, plus at least one joint with unique ids and distinct roles.
    pub fn validate(&self, exercise: &str) -> Result<(), ConfigError> {
        self.policy().map_err(|e| match e {
            ConfigError::Invalid { message } => {
                ConfigError::invalid(format!("exercise '{exercise}': {message}"))
            }
            other => other,
        })?;
        if self.joints.is_empty() {
            return Err(ConfigError::invalid(format!(
                "exercise '{exercise}' defines no joints"
            )));
        }
        let mut registry = JointRegistry::new();
        for definition in self.definitions(exercise) {
            registry.register(definition)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Landmarks with visibility below this are treated as absent.
    pub confidence_floor: f32,
    pub exercises: BTreeMap<String, ExerciseConfig>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::invalid(format!(
                "confidence_floor {} must be within 0..=1",
                self.confidence_floor
            )));
        }
        if self.exercises.is_empty() {
            return Err(ConfigError::invalid("no exercises configured"));
        }
        for (name, exercise) in &self.exercises {
            exercise.validate(name)?;
        }
        Ok(())
    }

    pub fn exercise(&self, name: &str) -> Result<&ExerciseConfig, ConfigError> {
        self.exercises
            .get(name)
            .ok_or_else(|| ConfigError::UnknownExercise { name: name.to_string() })
    }

    /// Joint definitions of every configured exercise.
    pub fn registry(&self) -> Result<JointRegistry, ConfigError> {
        let mut registry = JointRegistry::new();
        for (name, exercise) in &self.exercises {
            for definition in exercise.definitions(name) {
                registry.register(definition)?;
            }
        }
        Ok(registry)
    }
}
