//! Error types for the rep-sentinel engine.
//!
//! Per-frame conditions ([`FrameSkip`]) are recoverable: the frame is dropped
//! for the affected joint and processing continues. Everything else signals a
//! broken contract or bad input and is surfaced to the caller immediately.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::landmark::LandmarkRole;

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("frame skipped: {0}")]
    Frame(#[from] FrameSkip),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("pose estimator error: {0}")]
    Estimator(#[from] EstimatorError),
}

/// Why a frame produced no angle sample for one joint definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameSkip {
    /// Two of the three points coincide, so one ray has zero length.
    #[error("degenerate geometry: joint triangle collapsed")]
    DegenerateGeometry,

    /// Required landmarks were absent or below the visibility floor.
    #[error("incomplete landmarks: missing {missing:?}")]
    IncompleteLandmarks {
        /// Roles that were missing or not visible enough.
        missing: Vec<LandmarkRole>,
    },
}

/// Session lifecycle violations. These are caller bugs, never user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Mutation after close, or a second close.
    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidSessionState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Frame timestamps must strictly increase within a session.
    #[error("out-of-order frame: {received} does not follow {previous}")]
    OutOfOrderFrame {
        previous: DateTime<Utc>,
        received: DateTime<Utc>,
    },
}

impl SessionError {
    pub(crate) fn closed(expected: &'static str) -> Self {
        Self::InvalidSessionState {
            expected,
            actual: "closed",
        }
    }
}

/// Errors loading or validating exercise configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },

    #[error("unknown exercise '{name}'")]
    UnknownExercise { name: String },
}

impl ConfigError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Errors writing or reading the tabular export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected header {found:?}, expected {expected:?}")]
    Header {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Errors decoding raw pose-estimator output.
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("malformed pose record at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error reading pose records: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected at most {max} landmarks, got {got}")]
    TooManyLandmarks { max: usize, got: usize },
}
