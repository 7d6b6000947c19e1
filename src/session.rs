//! Session aggregation: the append-only log of samples and repetition events
//! that becomes the exported session record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::SessionError;
use crate::reps::RepetitionEvent;

/// Unique identifier for one tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One measured joint angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub definition_id: String,
    /// Degrees in `[0, 180]`.
    pub value_degrees: f64,
    pub timestamp: DateTime<Utc>,
}

/// Frozen result of a closed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub samples: Vec<AngleSample>,
    pub events: Vec<RepetitionEvent>,
    /// Always equal to `events.len()`.
    pub final_count: u32,
}

impl SessionRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// Pairs each sample with the cumulative repetition count of its own
    /// joint at that sample's time.
    pub fn samples_with_counts(&self) -> Vec<(&AngleSample, u32)> {
        let mut counts: std::collections::HashMap<&str, u32> = Default::default();
        let mut events = self.events.iter().peekable();
        self.samples
            .iter()
            .map(|sample| {
                while let Some(event) = events.next_if(|e| e.timestamp <= sample.timestamp) {
                    *counts.entry(event.definition_id.as_str()).or_default() += 1;
                }
                let count = counts
                    .get(sample.definition_id.as_str())
                    .copied()
                    .unwrap_or(0);
                (sample, count)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closed,
}

/// Accumulates samples and events for a single session.
///
/// Append-only while open. [`close_session`](Self::close_session) freezes the
/// record and hands it out exactly once.
#[derive(Debug)]
pub struct SessionAggregator {
    session_id: SessionId,
    start_time: DateTime<Utc>,
    samples: Vec<AngleSample>,
    events: Vec<RepetitionEvent>,
    lifecycle: Lifecycle,
}

impl SessionAggregator {
    pub fn open_session(start_time: DateTime<Utc>) -> Self {
        let session_id = SessionId::new();
        info!(session = %session_id, start = %start_time, "session opened");
        Self {
            session_id,
            start_time,
            samples: Vec::new(),
            events: Vec::new(),
            lifecycle: Lifecycle::Open,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn record_sample(&mut self, sample: AngleSample) -> Result<(), SessionError> {
        self.ensure_open("open session to record samples")?;
        self.samples.push(sample);
        Ok(())
    }

    pub fn record_event(&mut self, event: RepetitionEvent) -> Result<(), SessionError> {
        self.ensure_open("open session to record events")?;
        self.events.push(event);
        Ok(())
    }

    /// Freeze the session. A second call fails and returns nothing.
    pub fn close_session(
        &mut self,
        end_time: DateTime<Utc>,
    ) -> Result<SessionRecord, SessionError> {
        self.ensure_open("open session to close")?;
        self.lifecycle = Lifecycle::Closed;

        let events = std::mem::take(&mut self.events);
        let record = SessionRecord {
            session_id: self.session_id,
            start_time: self.start_time,
            end_time,
            samples: std::mem::take(&mut self.samples),
            final_count: events.len() as u32,
            events,
        };
        info!(
            session = %record.session_id,
            samples = record.samples.len(),
            reps = record.final_count,
            "session closed"
        );
        Ok(record)
    }

    fn ensure_open(&self, expected: &'static str) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Closed => Err(SessionError::closed(expected)),
        }
    }
}
