//! Packed parameter buffers used by the `*Inline` model variants.
//!
//! Layout: `[declared_size, reserved, p_0, ..., p_{declared_size-1}, trailing...]`.
//!
//! Legacy callers pass one flat buffer that carries both a variable-length
//! control-point vector and its length. Everything past the declared slice is
//! ignored. The reserved slot is written as `0.0` on encode.

use crate::error::AppError;

/// Offset of the first control point.
pub const HEADER_LEN: usize = 2;

/// Borrow the control points out of a packed buffer.
pub fn unpack(buffer: &[f64]) -> Result<&[f64], AppError> {
    let Some(&tag) = buffer.first() else {
        return Err(AppError::invalid_parameters("Packed parameter buffer is empty."));
    };
    if !(tag.is_finite() && tag >= 0.0 && tag.fract() == 0.0) {
        return Err(AppError::invalid_parameters(format!(
            "Packed size tag must be a non-negative integer, got {tag}."
        )));
    }

    if buffer.len() < HEADER_LEN {
        return Err(AppError::invalid_parameters("Packed parameter buffer has no header."));
    }

    // `as` saturates, so an absurd tag still compares as "too many".
    let size = tag as usize;
    let available = buffer.len() - HEADER_LEN;
    if size > available {
        return Err(AppError::invalid_parameters(format!(
            "Packed buffer declares {tag} values but holds only {available}."
        )));
    }
    Ok(&buffer[HEADER_LEN..HEADER_LEN + size])
}

/// Build a packed buffer around `values`.
pub fn pack(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(HEADER_LEN + values.len());
    out.push(values.len() as f64);
    out.push(0.0);
    out.extend_from_slice(values);
    out
}
