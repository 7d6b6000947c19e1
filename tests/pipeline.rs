//! End-to-end: recorded pose lines -> session -> record -> CSV.

use std::io::Cursor;

use chrono::{DateTime, Duration, Utc};
use rep_sentinel::{
    export, ChannelSink, Config, Error, ExerciseSession, FeedbackSink, FrameSource, LandmarkRole,
    RawPose, RecordedPose, SessionError, SessionSummary,
};

const CONFIG: &str = r#"
confidence_floor = 0.5

[exercises.squat]
lower_bound = 70.0
upper_bound = 160.0

[exercises.squat.zone_labels]
too_tight = "Knee bend too tight"
too_wide = "Knee bend too wide"
correct = "Correct bend"

[[exercises.squat.joints]]
id = "left_knee"
role_a = "left_hip"
role_b = "left_knee"
role_c = "left_ankle"
"#;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Raw 33-row pose whose left knee angle equals `degrees`.
fn raw_pose(at: DateTime<Utc>, degrees: f64, visibility: f32) -> RawPose {
    let mut rows = vec![vec![0.0_f32, 0.0, 0.0, 0.0]; 33];
    let (kx, ky, r) = (0.5_f64, 0.5_f64, 0.2_f64);
    let rad = degrees.to_radians();
    let hip = [(kx + r * rad.sin()) as f32, (ky + r * rad.cos()) as f32];
    rows[LandmarkRole::LeftHip.index()] = vec![hip[0], hip[1], 0.0, visibility];
    rows[LandmarkRole::LeftKnee.index()] = vec![kx as f32, ky as f32, 0.0, visibility];
    rows[LandmarkRole::LeftAnkle.index()] = vec![kx as f32, (ky + r) as f32, 0.0, visibility];
    RawPose {
        timestamp: at,
        landmarks: rows,
    }
}

fn recording(angles: &[f64]) -> String {
    angles
        .iter()
        .enumerate()
        .map(|(i, &deg)| {
            let at = t0() + Duration::milliseconds(33 * i as i64);
            serde_json::to_string(&raw_pose(at, deg, 0.9)).unwrap() + "\n"
        })
        .collect()
}

#[test]
fn replay_counts_two_squats() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let text = recording(&[170.0, 120.0, 60.0, 65.0, 165.0, 150.0, 55.0, 100.0, 175.0]);

    let mut session = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut estimator = RecordedPose::new();
    let (mut sink, rx) = ChannelSink::bounded(64);

    for raw in FrameSource::new(Cursor::new(text)) {
        let feedback = session.process_with(&mut estimator, &raw.unwrap()).unwrap();
        sink.publish(&feedback);
    }
    let record = session.finish(t0() + Duration::seconds(1)).unwrap();

    assert_eq!(record.final_count, 2);
    assert_eq!(record.events.len(), 2);
    assert_eq!(record.samples.len(), 9);

    let reps: Vec<u32> = rx
        .try_iter()
        .map(|f| f.primary().unwrap().reps)
        .collect();
    assert_eq!(reps, [0, 0, 0, 0, 1, 1, 1, 1, 2]);

    let summary = SessionSummary::from_record(&record);
    assert_eq!(summary.total_reps, 2);
    assert_eq!(summary.joints["left_knee"].reps, 2);
}

#[test]
fn exported_rows_round_trip() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let mut session = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut estimator = RecordedPose::new();
    for raw in FrameSource::new(Cursor::new(recording(&[170.0, 60.0, 170.0, 100.0]))) {
        session.process_with(&mut estimator, &raw.unwrap()).unwrap();
    }
    let record = session.finish(t0() + Duration::seconds(1)).unwrap();

    let mut buf = Vec::new();
    export::write_csv(&record, &mut buf).unwrap();
    let parsed = export::read_csv(buf.as_slice()).unwrap();

    assert_eq!(parsed, export::rows(&record));
    let reps: Vec<u32> = parsed.iter().map(|r| r.repetitions).collect();
    assert_eq!(reps, [0, 0, 1, 1]);
    for (row, sample) in parsed.iter().zip(&record.samples) {
        assert_eq!(row.timestamp, sample.timestamp);
        assert_eq!(row.angle, sample.value_degrees);
    }
}

#[test]
fn export_file_round_trip() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let mut session = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut estimator = RecordedPose::new();
    for raw in FrameSource::new(Cursor::new(recording(&[170.0, 60.0, 170.0]))) {
        session.process_with(&mut estimator, &raw.unwrap()).unwrap();
    }
    let record = session.finish(t0() + Duration::seconds(1)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(export::default_file_name(&t0()));
    export::write_csv_file(&record, &path).unwrap();
    let parsed = export::read_csv(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed.last().unwrap().repetitions, 1);
}

#[test]
fn low_confidence_frames_never_count() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let mut session = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut estimator = RecordedPose::new();

    let at = |i: i64| t0() + Duration::milliseconds(33 * i);
    session
        .process_with(&mut estimator, &raw_pose(at(0), 170.0, 0.9))
        .unwrap();
    session
        .process_with(&mut estimator, &raw_pose(at(1), 60.0, 0.2))
        .unwrap();
    session
        .process_with(&mut estimator, &raw_pose(at(2), 170.0, 0.9))
        .unwrap();

    // the bend was never seen, so the extension does not count
    assert_eq!(session.total_reps(), 0);
    let record = session.finish(at(3)).unwrap();
    assert_eq!(record.samples.len(), 2);
}

#[test]
fn sessions_are_isolated() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let mut a = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut b = ExerciseSession::start(&config, "squat", t0()).unwrap();
    assert_ne!(a.session_id(), b.session_id());

    let mut estimator = RecordedPose::new();
    for raw in FrameSource::new(Cursor::new(recording(&[170.0, 60.0, 170.0]))) {
        a.process_with(&mut estimator, &raw.unwrap()).unwrap();
    }
    for raw in FrameSource::new(Cursor::new(recording(&[170.0, 60.0]))) {
        b.process_with(&mut estimator, &raw.unwrap()).unwrap();
    }
    assert_eq!(a.total_reps(), 1);
    assert_eq!(b.total_reps(), 0);
}

#[test]
fn unknown_exercise_is_rejected() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    assert!(matches!(
        ExerciseSession::start(&config, "deadlift", t0()),
        Err(Error::Config(_))
    ));
}

#[test]
fn second_finish_loses_nothing() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let mut session = ExerciseSession::start(&config, "squat", t0()).unwrap();
    let mut estimator = RecordedPose::new();
    for raw in FrameSource::new(Cursor::new(recording(&[170.0, 60.0, 170.0]))) {
        session.process_with(&mut estimator, &raw.unwrap()).unwrap();
    }
    let record = session.finish(t0() + Duration::seconds(1)).unwrap();
    assert_eq!(record.final_count, 1);

    let again = session.finish(t0() + Duration::seconds(2));
    assert!(matches!(
        again,
        Err(Error::Session(SessionError::InvalidSessionState { .. }))
    ));
    assert_eq!(record.events.len(), 1);
}
