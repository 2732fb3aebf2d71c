//! Read/write profile JSON files.
//!
//! Profile JSON is the portable representation of an evaluated profile:
//! - model kind (name and legacy code) + parameters + thickness
//! - the physical quantity the values describe
//! - the evaluated depth/value grid for quick plotting
//!
//! The schema is defined by `domain::ProfileFile`.

use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

use crate::domain::{ModelKind, ProfileFile, ProfileGrid, ProfileQuantity};
use crate::error::{AppError, ErrorKind};

pub const TOOL_NAME: &str = "dprof";

/// An evaluated profile together with what produced it.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRecord<'a> {
    pub quantity: ProfileQuantity,
    pub model: ModelKind,
    pub params: &'a [f64],
    pub thickness: f64,
    pub depth: &'a [f64],
    pub value: &'a [f64],
}

/// Build the on-disk representation, stamped with the current UTC time.
pub fn profile_file(record: &ProfileRecord<'_>) -> Result<ProfileFile, AppError> {
    if record.depth.len() != record.value.len() {
        return Err(AppError::degenerate(format!(
            "Profile grid length mismatch: {} depths vs {} values.",
            record.depth.len(),
            record.value.len()
        )));
    }

    Ok(ProfileFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        quantity: record.quantity,
        model: record.model,
        model_code: record.model.code(),
        params: record.params.to_vec(),
        thickness: record.thickness,
        grid: ProfileGrid {
            depth: record.depth.to_vec(),
            value: record.value.to_vec(),
        },
    })
}

/// Write a profile JSON file.
pub fn write_profile_json(path: &Path, record: &ProfileRecord<'_>) -> Result<(), AppError> {
    let profile = profile_file(record)?;
    let file = File::create(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create profile JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(file, &profile)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write profile JSON: {e}")))?;

    Ok(())
}

/// Read a profile JSON file.
pub fn read_profile_json(path: &Path) -> Result<ProfileFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open profile JSON '{}': {e}", path.display()),
        )
    })?;
    let profile: ProfileFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Invalid profile JSON: {e}")))?;

    // The name and the legacy code must agree.
    let from_code = ModelKind::from_code(profile.model_code as i64)?;
    if from_code != profile.model {
        return Err(AppError::new(
            ErrorKind::UnsupportedVariant,
            format!(
                "Profile JSON names model '{}' but carries code {}.",
                profile.model.display_name(),
                profile.model_code
            ),
        ));
    }
    Ok(profile)
}
