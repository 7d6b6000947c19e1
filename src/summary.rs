//! Post-session statistics derived from a closed record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::{SessionId, SessionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSummary {
    pub reps: u32,
    pub angles: Option<AngleStats>,
    /// Mean seconds between consecutive repetitions; needs two or more reps.
    pub mean_rep_interval_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub duration_secs: f64,
    pub total_reps: u32,
    pub joints: BTreeMap<String, JointSummary>,
}

impl SessionSummary {
    pub fn from_record(record: &SessionRecord) -> Self {
        let mut angles: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for sample in &record.samples {
            angles
                .entry(sample.definition_id.as_str())
                .or_default()
                .push(sample.value_degrees);
        }
        let mut rep_times: BTreeMap<&str, Vec<_>> = BTreeMap::new();
        for event in &record.events {
            rep_times
                .entry(event.definition_id.as_str())
                .or_default()
                .push(event.timestamp);
        }

        let ids: Vec<&str> = angles.keys().chain(rep_times.keys()).copied().collect();
        let mut joints = BTreeMap::new();
        for id in ids {
            if joints.contains_key(id) {
                continue;
            }
            let times = rep_times.get(id).map(Vec::as_slice).unwrap_or_default();
            let intervals: Vec<f64> = times
                .windows(2)
                .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
                .collect();
            joints.insert(
                id.to_string(),
                JointSummary {
                    reps: times.len() as u32,
                    angles: angles.get(id).and_then(|v| stats(v)),
                    mean_rep_interval_secs: mean(&intervals),
                },
            );
        }

        Self {
            session_id: record.session_id,
            duration_secs: record.duration().num_milliseconds() as f64 / 1000.0,
            total_reps: record.final_count,
            joints,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn stats(values: &[f64]) -> Option<AngleStats> {
    let mean = mean(values)?;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some(AngleStats {
        min,
        max,
        mean,
        count: values.len(),
    })
}
