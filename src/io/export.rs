//! Export depth/value tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or plotting scripts.

use std::path::Path;

use crate::domain::ProfileQuantity;
use crate::error::{AppError, ErrorKind};

/// One exported column beyond `depth`.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Column header for a quantity, e.g. `strain` or `debye_waller`.
pub fn quantity_column(quantity: ProfileQuantity) -> &'static str {
    match quantity {
        ProfileQuantity::Strain => "strain",
        ProfileQuantity::DebyeWaller => "debye_waller",
    }
}

/// Write `depth` plus one or more value columns to a CSV file.
pub fn write_profile_csv(path: &Path, depth: &[f64], columns: &[Column<'_>]) -> Result<(), AppError> {
    if let Some(bad) = columns.iter().find(|c| c.values.len() != depth.len()) {
        return Err(AppError::degenerate(format!(
            "Column '{}' has {} values for {} depths.",
            bad.name,
            bad.values.len(),
            depth.len()
        )));
    }

    let csv_err = |e: csv::Error| AppError::new(ErrorKind::Io, format!("Failed to write export CSV: {e}"));

    let mut wtr = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    let mut header = vec!["depth"];
    header.extend(columns.iter().map(|c| c.name));
    wtr.write_record(&header).map_err(csv_err)?;

    for (i, d) in depth.iter().enumerate() {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(format!("{d:.6}"));
        row.extend(columns.iter().map(|c| format!("{:.10e}", c.values[i])));
        wtr.write_record(&row).map_err(csv_err)?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to flush export CSV: {e}")))?;

    Ok(())
}
