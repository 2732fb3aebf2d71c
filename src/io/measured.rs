//! Read measured two-column profiles (depth, strain or DW value).
//!
//! Accepted layouts:
//! - comma-, tab-, or space-separated columns (runs of spaces are fine)
//! - `#` comment lines
//! - an optional header row on the first data line
//!
//! Extra columns are ignored; only the first two are read.

use std::path::Path;

use csv::StringRecord;

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredProfile {
    pub depth: Vec<f64>,
    pub values: Vec<f64>,
}

/// Read a measured profile from disk.
pub fn read_measured_xy(path: &Path) -> Result<MeasuredProfile, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open measured profile '{}': {e}", path.display()),
        )
    })?;
    parse_measured_xy(&text)
}

/// Parse measured profile text.
pub fn parse_measured_xy(text: &str) -> Result<MeasuredProfile, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let mut depth = Vec::new();
    let mut values = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| AppError::degenerate(format!("Measured profile parse error: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);

        let fields = numeric_fields(&record);
        if fields.is_empty() {
            continue;
        }
        match parse_pair(&fields) {
            Ok((d, v)) => {
                depth.push(d);
                values.push(v);
            }
            // A non-numeric first row is a header.
            Err(_) if depth.is_empty() && idx == 0 => continue,
            Err(msg) => return Err(AppError::degenerate(format!("Line {line}: {msg}"))),
        }
    }

    if depth.is_empty() {
        return Err(AppError::degenerate("Measured profile holds no data rows."));
    }
    Ok(MeasuredProfile { depth, values })
}

fn sniff_delimiter(text: &str) -> u8 {
    let sample = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or("");
    if sample.contains(',') {
        b','
    } else if sample.contains('\t') {
        b'\t'
    } else {
        b' '
    }
}

/// Non-empty fields; runs of the delimiter produce empty ones.
fn numeric_fields(record: &StringRecord) -> Vec<&str> {
    record.iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn parse_pair(fields: &[&str]) -> Result<(f64, f64), String> {
    if fields.len() < 2 {
        return Err(format!("expected 2 columns, found {}", fields.len()));
    }
    let parse = |s: &str| -> Result<f64, String> {
        let v = s.parse::<f64>().map_err(|_| format!("'{s}' is not a number"))?;
        if v.is_finite() { Ok(v) } else { Err(format!("'{s}' is not finite")) }
    };
    Ok((parse(fields[0])?, parse(fields[1])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_space_separated_columns() {
        let text = "# strain profile\n0.0   0.010\n10.0  0.020\n\n20.0\t 0.005\n";
        let p = parse_measured_xy(text).unwrap();
        assert_eq!(p.depth, vec![0.0, 10.0, 20.0]);
        assert_eq!(p.values, vec![0.010, 0.020, 0.005]);
    }

    #[test]
    fn reads_csv_with_header_and_extra_columns() {
        let text = "depth,strain,fit\n0,1e-3,0\n5,2e-3,0\n";
        let p = parse_measured_xy(text).unwrap();
        assert_eq!(p.depth, vec![0.0, 5.0]);
        assert_eq!(p.values, vec![1e-3, 2e-3]);
    }

    #[test]
    fn bad_rows_are_reported_with_line() {
        let err = parse_measured_xy("0 1\n1 x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        assert!(err.to_string().contains("Line 2"), "{err}");

        let err = parse_measured_xy("0 1\n2\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn empty_file_is_degenerate() {
        let err = parse_measured_xy("# nothing here\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn missing_file_is_io() {
        let err = read_measured_xy(Path::new("/nonexistent/dprof/strain.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
