//! Pseudo-Voigt line shape.
//!
//! `pv(x) = η · L(x) + (1 - η) · G(x)` where, with `u = (x - center) / (fwhm / 2)`,
//!
//! - `G(x) = height · exp(-ln 2 · u²)`
//! - `L(x) = height / (1 + u²)`
//!
//! Both components are height-normalised, so `pv(center) = height` for any `η`.

/// Floor on the half width so a collapsed peak stays finite.
const HWHM_EPS: f64 = 1e-12;

/// Evaluate a single pseudo-Voigt sample.
pub fn pseudo_voigt(x: f64, height: f64, center: f64, fwhm: f64, eta: f64) -> f64 {
    let hwhm = (0.5 * fwhm).abs().max(HWHM_EPS);
    let u = (x - center) / hwhm;
    let u2 = u * u;

    let gauss = height * (-std::f64::consts::LN_2 * u2).exp();
    let lorentz = height / (1.0 + u2);
    eta * lorentz + (1.0 - eta) * gauss
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_value_is_height() {
        for &eta in &[0.0, 0.3, 1.0] {
            let v = pseudo_voigt(5.0, 2.5, 5.0, 1.0, eta);
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn half_maximum_at_half_width() {
        for &eta in &[0.0, 0.5, 1.0] {
            let v = pseudo_voigt(10.5, 4.0, 10.0, 1.0, eta);
            assert!((v - 2.0).abs() < 1e-12, "eta={eta}: got {v}");
        }
    }

    #[test]
    fn zero_width_stays_finite() {
        let values: Vec<f64> = [0.0, 1.0, 2.0].iter().map(|&x| pseudo_voigt(x, 1.0, 1.0, 0.0, 0.5)).collect();
        assert!(values.iter().all(|v| v.is_finite()));
        assert!((values[1] - 1.0).abs() < 1e-12);
    }
}
