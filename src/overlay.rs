//! Hand-off of per-frame feedback to the presentation layer.
//!
//! The engine never draws or speaks. It pushes [`FrameFeedback`] values into
//! a sink and the consumer renders them on its own schedule.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tracing::{info, warn};

use crate::tracker::FrameFeedback;

pub trait FeedbackSink {
    /// Must not block the frame loop.
    fn publish(&mut self, feedback: &FrameFeedback);
}

/// Bounded channel to a presentation thread. Drops feedback when the
/// consumer falls behind instead of stalling frame processing.
pub struct ChannelSink {
    tx: Sender<FrameFeedback>,
    dropped: u64,
    disconnected: bool,
}

impl ChannelSink {
    pub fn bounded(capacity: usize) -> (Self, Receiver<FrameFeedback>) {
        let (tx, rx) = channel::bounded(capacity);
        (
            Self {
                tx,
                dropped: 0,
                disconnected: false,
            },
            rx,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// True once the consumer has hung up. Every later frame is dropped.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl FeedbackSink for ChannelSink {
    fn publish(&mut self, feedback: &FrameFeedback) {
        match self.tx.try_send(feedback.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    warn!(dropped = self.dropped, "feedback consumer lagging");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                if !self.disconnected {
                    self.disconnected = true;
                    warn!("feedback consumer disconnected, dropping further frames");
                }
            }
        }
    }
}

/// Writes each repetition and zone change through `tracing`.
#[derive(Default)]
pub struct LogSink {
    last_label: Option<String>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackSink for LogSink {
    fn publish(&mut self, feedback: &FrameFeedback) {
        for event in &feedback.events {
            info!(
                joint = %event.definition_id,
                rep = event.index,
                angle = event.angle_at_trigger,
                "Repetitions: {}",
                event.index
            );
        }

        let label = feedback.primary().and_then(|j| j.label.clone());
        if let Some(text) = label.as_deref().filter(|_| label != self.last_label) {
            info!("{text}");
        }
        self.last_label = label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::PostureZone;
    use crate::tracker::JointFeedback;
    use chrono::Utc;

    fn feedback(reps: u32) -> FrameFeedback {
        FrameFeedback {
            timestamp: Utc::now(),
            joints: vec![JointFeedback {
                definition_id: "left_knee".into(),
                angle: Some(120.0),
                zone: Some(PostureZone::Correct),
                label: Some("ok".into()),
                reps,
            }],
            events: Vec::new(),
        }
    }

    #[test]
    fn channel_delivers_in_order() {
        let (mut sink, rx) = ChannelSink::bounded(4);
        sink.publish(&feedback(0));
        sink.publish(&feedback(1));
        let got: Vec<u32> = rx.try_iter().map(|f| f.joints[0].reps).collect();
        assert_eq!(got, [0, 1]);
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.publish(&feedback(0));
        sink.publish(&feedback(1));
        sink.publish(&feedback(2));
        assert_eq!(sink.dropped(), 2);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn consumer_on_another_thread() {
        let (mut sink, rx) = ChannelSink::bounded(16);
        let handle = std::thread::spawn(move || rx.iter().map(|f| f.joints[0].reps).sum::<u32>());
        for reps in 0..5 {
            sink.publish(&feedback(reps));
        }
        drop(sink);
        assert_eq!(handle.join().unwrap(), 10);
    }

    #[test]
    fn hung_up_consumer_is_flagged_once() {
        let (mut sink, rx) = ChannelSink::bounded(4);
        sink.publish(&feedback(0));
        assert!(!sink.is_disconnected());
        drop(rx);
        sink.publish(&feedback(1));
        sink.publish(&feedback(2));
        assert!(sink.is_disconnected());
        assert_eq!(sink.dropped(), 2);
    }
}
