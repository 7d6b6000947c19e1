//! Tabular session export.
//!
//! Column names and order are an external contract shared with downstream
//! report tooling: `Timestamp,Repetitions,Angle`.

use std::fmt::Display;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::session::SessionRecord;

pub const HEADER: [&str; 3] = ["Timestamp", "Repetitions", "Angle"];

/// One exported sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Repetitions")]
    pub repetitions: u32,
    #[serde(rename = "Angle")]
    pub angle: f64,
}

/// Rows for every sample, in record order.
pub fn rows(record: &SessionRecord) -> Vec<ExportRow> {
    record
        .samples_with_counts()
        .into_iter()
        .map(|(sample, repetitions)| ExportRow {
            timestamp: sample.timestamp,
            repetitions,
            angle: sample.value_degrees,
        })
        .collect()
}

pub fn write_csv<W: Write>(record: &SessionRecord, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    // header must appear even for an empty session
    wtr.write_record(HEADER)?;
    for row in rows(record) {
        wtr.write_record(&[
            row.timestamp.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
            row.repetitions.to_string(),
            row.angle.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(record: &SessionRecord, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(record, file)
}

/// Parse an export back into rows. Rejects any other header.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let found: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if found != HEADER {
        return Err(ExportError::Header {
            expected: HEADER.iter().map(|h| h.to_string()).collect(),
            found,
        });
    }
    rdr.deserialize()
        .collect::<Result<Vec<ExportRow>, csv::Error>>()
        .map_err(ExportError::from)
}

/// `analysis_<YYYYmmdd_HHMMSS>.csv` for the given wall-clock time.
pub fn default_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("analysis_%Y%m%d_%H%M%S.csv").to_string()
}
