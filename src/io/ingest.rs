//! CSV ingest for gravity readings.
//!
//! Turns a hydrometer/tilt-style log into clean `(hours, sg)` readings.
//!
//! Accepted layouts (header names are case-insensitive):
//! - `hours` / `elapsed_hours` + `sg` / `gravity` / `specific_gravity`
//! - `timestamp` / `time` / `datetime` + gravity column; timestamps become
//!   hours since the first valid row
//!
//! Bad rows are skipped and reported; an out-of-order log is rejected outright
//! because the predictor assumes chronological input.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use tracing::warn;

use crate::domain::{DatasetStats, Reading};
use crate::error::AppError;

const SG_PLAUSIBLE: (f64, f64) = (0.900, 1.300);

/// Which column supplied the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumn {
    Hours,
    Timestamp,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: readings + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedReadings {
    pub readings: Vec<Reading>,
    pub stats: DatasetStats,
    pub time_column: TimeColumn,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedReadings {
    pub fn times(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.hours).collect()
    }

    pub fn sgs(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.sg).collect()
    }
}

/// Load readings from a CSV file.
pub fn load_readings(path: &Path) -> Result<IngestedReadings, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_readings(file)
}

/// Parse readings from any CSV source.
pub fn read_readings<R: Read>(source: R) -> Result<IngestedReadings, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let sg_idx = find_column(&header_map, &["sg", "gravity", "specific_gravity"])
        .ok_or_else(|| AppError::input("CSV needs a gravity column (sg, gravity, or specific_gravity)."))?;
    let (time_column, time_idx) = if let Some(idx) = find_column(&header_map, &["hours", "elapsed_hours"]) {
        (TimeColumn::Hours, idx)
    } else if let Some(idx) = find_column(&header_map, &["timestamp", "time", "datetime"]) {
        (TimeColumn::Timestamp, idx)
    } else {
        return Err(AppError::input(
            "CSV needs a time column (hours, elapsed_hours, timestamp, time, or datetime).",
        ));
    };

    let mut readings = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut origin: Option<DateTime<Utc>> = None;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, time_column, time_idx, sg_idx, &mut origin));

        match parsed {
            Ok(reading) => readings.push(reading),
            Err(message) => {
                warn!(line, %message, "skipping reading");
                row_errors.push(RowError { line, message });
            }
        }
    }

    if let Some(pos) = readings.windows(2).position(|w| w[1].hours < w[0].hours) {
        return Err(AppError::input(format!(
            "Readings are not in chronological order (reading {} at {:.3}h follows {:.3}h).",
            pos + 2,
            readings[pos + 1].hours,
            readings[pos].hours
        )));
    }

    let stats = DatasetStats::from_readings(&readings)
        .ok_or_else(|| AppError::insufficient("No valid readings remain after parsing."))?;

    Ok(IngestedReadings {
        readings,
        stats,
        time_column,
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    time_column: TimeColumn,
    time_idx: usize,
    sg_idx: usize,
    origin: &mut Option<DateTime<Utc>>,
) -> Result<Reading, String> {
    let sg_raw = field(record, sg_idx).ok_or("missing gravity")?;
    let sg: f64 = sg_raw.parse().map_err(|_| format!("invalid gravity '{sg_raw}'"))?;
    if !(sg.is_finite() && sg >= SG_PLAUSIBLE.0 && sg <= SG_PLAUSIBLE.1) {
        return Err(format!("implausible gravity {sg}"));
    }

    let time_raw = field(record, time_idx).ok_or("missing time")?;
    let hours = match time_column {
        TimeColumn::Hours => {
            let h: f64 = time_raw.parse().map_err(|_| format!("invalid hours '{time_raw}'"))?;
            if !(h.is_finite() && h >= 0.0) {
                return Err(format!("hours must be finite and >= 0, got {h}"));
            }
            h
        }
        TimeColumn::Timestamp => {
            let ts = parse_timestamp(time_raw).ok_or_else(|| format!("invalid timestamp '{time_raw}'"))?;
            let start = *origin.get_or_insert(ts);
            (ts - start).num_milliseconds() as f64 / 3_600_000.0
        }
    };

    Ok(Reading { hours, sg })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|s| !s.is_empty())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hours_layout() {
        let csv = "hours,sg\n0,1.055\n12,1.048\n24,1.040\n";
        let data = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(data.time_column, TimeColumn::Hours);
        assert_eq!(data.readings.len(), 3);
        assert_eq!(data.readings[2], Reading { hours: 24.0, sg: 1.040 });
        assert_eq!(data.stats.sg_max, 1.055);
    }

    #[test]
    fn converts_timestamps_to_elapsed_hours() {
        let csv = "\u{feff}Timestamp,Gravity\n\
                   2025-03-01T08:00:00Z,1.060\n\
                   2025-03-01 14:30:00,1.057\n\
                   2025-03-02T08:00:00+00:00,1.050\n";
        let data = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(data.time_column, TimeColumn::Timestamp);
        let hours = data.times();
        assert_eq!(hours, vec![0.0, 6.5, 24.0]);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "hours,sg\n0,1.055\n4,abc\n8,\n12,2.5\n16,1.044\n";
        let data = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(data.readings.len(), 2);
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.row_errors.iter().map(|e| e.line).collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn out_of_order_readings_are_rejected() {
        let csv = "hours,sg\n0,1.055\n12,1.048\n6,1.050\n";
        let err = read_readings(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_columns_and_empty_data() {
        assert_eq!(read_readings("hours,temp\n0,20\n".as_bytes()).unwrap_err().exit_code(), 2);
        assert_eq!(read_readings("sg,temp\n1.05,20\n".as_bytes()).unwrap_err().exit_code(), 2);
        assert_eq!(read_readings("hours,sg\n".as_bytes()).unwrap_err().exit_code(), 3);
    }
}
