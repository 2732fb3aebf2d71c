//! Formatted terminal output for evaluations, resamples, and fits.
//!
//! Formatting lives in one place so the numeric code stays free of printing
//! concerns and output changes stay localized.

use crate::domain::{ModelKind, ProfileFit, ProfileQuantity};
use crate::models::packed;

/// Header lines shared by every report.
fn format_model_header(out: &mut String, model: ModelKind, thickness: f64) {
    out.push_str(&format!(
        "Model: {} (code {})\n",
        model.display_name(),
        model.code()
    ));
    out.push_str(&format!("Thickness: {thickness:.4}\n"));
}

/// Summary of a single profile evaluation, followed by a depth/value table.
pub fn format_eval_summary(
    quantity: ProfileQuantity,
    model: ModelKind,
    params: &[f64],
    thickness: f64,
    depth: &[f64],
    values: &[f64],
    max_rows: usize,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== dprof - {} profile ===\n", quantity.display_name()));
    format_model_header(&mut out, model, thickness);
    out.push_str(&format!("Parameters: {}\n", fmt_params(model, params)));

    if let Some((lo, hi)) = min_max(values) {
        out.push_str(&format!(
            "Grid: n={} | depth=[{:.3}, {:.3}] | value=[{:.6e}, {:.6e}]\n",
            depth.len(),
            depth.first().copied().unwrap_or(0.0),
            depth.last().copied().unwrap_or(0.0),
            lo,
            hi
        ));
    }
    out.push('\n');
    out.push_str(&format_profile_table(depth, values, max_rows));

    out
}

/// Summary of a resample or fit outcome.
///
/// `truth`, when given, is compared element-wise with the recovered parameters
/// (both in the model's own convention).
pub fn format_fit_summary(title: &str, fit: &ProfileFit, truth: Option<&[f64]>) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== dprof - {title} ===\n"));
    format_model_header(&mut out, fit.model, fit.thickness);
    out.push_str(&format!(
        "Solver: {} after {} iterations ({} evaluations) | converged={}\n",
        fit.status.termination.display_name(),
        fit.status.iterations,
        fit.status.evaluations,
        fit.status.converged
    ));
    out.push_str(&format!("SSE={:.6e} RMSE={:.6e}\n", fit.sse, fit.rmse));

    out.push_str("\nParameters:\n");
    out.push_str(&format!("- fitted: {}\n", fmt_params(fit.model, &fit.params)));
    if let Some(truth) = truth {
        out.push_str(&format!("- truth : {}\n", fmt_params(fit.model, truth)));
        let diff = max_abs_diff(unpacked(fit.model, &fit.params), unpacked(fit.model, truth));
        if let Some(d) = diff {
            out.push_str(&format!("- max |fitted - truth| = {d:.3e}\n"));
        }
    }
    if !fit.status.converged {
        out.push_str("\nWarning: solver did not converge; parameters are a best effort.\n");
    }

    out
}

/// Depth/value table, thinned to at most `max_rows` evenly spaced rows.
pub fn format_profile_table(depth: &[f64], values: &[f64], max_rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>12} {:>16}\n", "depth", "value"));
    out.push_str(&format!("{:-<12} {:-<16}\n", "", ""));

    let n = depth.len().min(values.len());
    for i in row_indices(n, max_rows) {
        out.push_str(&format!("{:>12.4} {:>16.6e}\n", depth[i], values[i]));
    }

    out
}

/// Evenly spaced row indices that always include the first and last row.
fn row_indices(n: usize, max_rows: usize) -> Vec<usize> {
    if n == 0 || max_rows == 0 {
        return Vec::new();
    }
    if n <= max_rows {
        return (0..n).collect();
    }
    if max_rows == 1 {
        return vec![0];
    }
    let step = (n - 1) as f64 / (max_rows - 1) as f64;
    let mut out: Vec<usize> = (0..max_rows).map(|k| (k as f64 * step).round() as usize).collect();
    out.dedup();
    out
}

/// Packed buffers are shown with their declared size.
fn fmt_params(model: ModelKind, params: &[f64]) -> String {
    if model.is_inline() {
        if let Ok(points) = packed::unpack(params) {
            return format!("packed size={} {}", points.len(), fmt_vec(points));
        }
    }
    fmt_vec(params)
}

fn unpacked(model: ModelKind, params: &[f64]) -> &[f64] {
    if model.is_inline() {
        packed::unpack(params).unwrap_or(params)
    } else {
        params
    }
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).reduce(f64::max)
}

fn min_max(v: &[f64]) -> Option<(f64, f64)> {
    let lo = v.iter().copied().reduce(f64::min)?;
    let hi = v.iter().copied().reduce(f64::max)?;
    Some((lo, hi))
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
