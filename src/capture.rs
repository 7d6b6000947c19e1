use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::EstimatorError;
use crate::inference::RawPose;

/// Replays recorded pose-estimator output, one JSON object per line.
pub struct FrameSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl FrameSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> FrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Next recorded pose, skipping blank lines. `None` at end of input.
    pub fn read_pose(&mut self) -> Result<Option<RawPose>, EstimatorError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| EstimatorError::Json {
                    line: self.line,
                    source,
                });
        }
    }
}

impl<R: BufRead> Iterator for FrameSource<R> {
    type Item = Result<RawPose, EstimatorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_pose().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_lines_and_skips_blanks() {
        let input = concat!(
            r#"{"timestamp":"2024-03-01T10:00:00Z","landmarks":[[0.1,0.2,0.0,0.9]]}"#,
            "\n\n",
            r#"{"timestamp":"2024-03-01T10:00:00.033Z","landmarks":[]}"#,
            "\n",
        );
        let poses: Vec<_> = FrameSource::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].landmarks[0], vec![0.1, 0.2, 0.0, 0.9]);
        assert!(poses[1].landmarks.is_empty());
    }

    #[test]
    fn reports_line_of_bad_record() {
        let input = "{\"timestamp\":\"2024-03-01T10:00:00Z\"}\nnot json\n";
        let mut source = FrameSource::new(Cursor::new(input));
        assert!(source.next().unwrap().is_ok());
        match source.next() {
            Some(Err(EstimatorError::Json { line, .. })) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
